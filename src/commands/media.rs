use anyhow::Result;

use hitl_desk::endpoints::media::format_file_size;

use super::App;
use crate::cli::MediaCommand;
use crate::output::{notify, table, Notice};

pub async fn run(command: MediaCommand, ctx: &mut App) -> Result<()> {
    match command {
        MediaCommand::List { project } => {
            let files = ctx.store.media(project).await?;
            ctx.out.emit(&files, |files| {
                if files.is_empty() {
                    println!("No media uploaded yet.");
                    return;
                }
                let rows: Vec<Vec<String>> = files
                    .iter()
                    .map(|file| {
                        vec![
                            file.original_name.clone(),
                            file.mime_type.clone(),
                            format_file_size(file.size_bytes),
                            file.reference(),
                        ]
                    })
                    .collect();
                println!("{}", table(&["NAME", "TYPE", "SIZE", "REFERENCE"], &rows));
                println!("\nPut a reference in a dataset cell to show the file to raters.");
            })
        }
        MediaCommand::Upload { project, files } => {
            let response = ctx.store.upload_media(project, &files).await?;
            if ctx.out.is_json() {
                return ctx.out.json(&response);
            }
            for file in &response.files {
                println!("{}  {}", file.reference(), file.original_name);
            }
            notify(Notice::Success, &format!("Uploaded {} file(s)", response.files.len()));
            Ok(())
        }
        MediaCommand::Delete { project, media } => {
            ctx.store.delete_media(project, media).await?;
            notify(Notice::Success, "Media file deleted");
            Ok(())
        }
    }
}
