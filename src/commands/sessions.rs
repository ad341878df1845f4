use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use hitl_desk::endpoints::auth::Role;
use hitl_desk::endpoints::sessions::{PaginatedRows, SessionDetail, SessionListItem};
use hitl_desk::guard::Route;
use hitl_desk::media::parse_row_content;

use super::{require_role, require_route, App};
use crate::cli::SessionsCommand;
use crate::output::{notify, progress_bar, table, Notice};

const CELL_PREVIEW_CHARS: usize = 40;

pub async fn run(command: SessionsCommand, ctx: &mut App) -> Result<()> {
    match command {
        SessionsCommand::List { project } => {
            require_route(ctx, Route::ProjectSessions(project)).await?;
            let sessions = ctx.store.project_sessions(project).await?;
            ctx.out.emit(&sessions, |sessions| print_sessions(sessions))
        }
        SessionsCommand::Show { session } => {
            require_route(ctx, Route::Rate(session)).await?;
            let detail = ctx.store.session(session).await?;
            ctx.out.emit(&detail, print_session)
        }
        SessionsCommand::Upload { project, file, name } => {
            require_role(ctx, Role::Requester).await?;
            let response = ctx.store.upload_dataset(project, &file, name.as_deref()).await?;
            if ctx.out.is_json() {
                return ctx.out.json(&response);
            }
            notify(
                Notice::Success,
                &format!(
                    "Uploaded {} as session {} with {} rows ({})",
                    response.filename, response.session_name, response.row_count, response.session_id
                ),
            );
            Ok(())
        }
        SessionsCommand::Delete { session, yes } => {
            require_role(ctx, Role::Requester).await?;
            let detail = ctx.store.session(session).await?;
            let question = format!(
                "Delete session {} with {} rows and their ratings?",
                detail.session.name, detail.counts.row_count
            );
            if !yes && !ctx.prompt.confirm(&question).await? {
                notify(Notice::Info, "Cancelled");
                return Ok(());
            }
            ctx.store.delete_session(session).await?;
            notify(Notice::Success, &format!("Session {} deleted", detail.session.name));
            Ok(())
        }
        SessionsCommand::Export { session, format, output } => {
            require_role(ctx, Role::Requester).await?;
            let export = ctx.store.export_session(session, format).await?;
            let path = export_path(output.as_deref(), &export.file_name);
            tokio::fs::write(&path, &export.bytes)
                .await
                .with_context(|| format!("writing {}", path.display()))?;
            notify(Notice::Success, &format!("Exported to {}", path.display()));
            Ok(())
        }
        SessionsCommand::Rows { session, page, per_page, filter } => {
            require_route(ctx, Route::Rate(session)).await?;
            let per_page = per_page.unwrap_or(ctx.config.per_page);
            let detail = ctx.store.session(session).await?;
            let rows = ctx.store.rows(session, page, per_page, filter).await?;
            let api_url = ctx.store.client().base_url().to_string();
            ctx.out.emit(&rows, |rows| print_rows(&detail, rows, &api_url))
        }
    }
}

/// A directory gets the suggested file name; anything else is the file itself.
fn export_path(output: Option<&Path>, file_name: &str) -> PathBuf {
    match output {
        Some(path) if path.is_dir() => path.join(file_name),
        Some(path) => path.to_path_buf(),
        None => PathBuf::from(file_name),
    }
}

fn print_sessions(sessions: &[SessionListItem]) {
    if sessions.is_empty() {
        println!("No sessions yet.");
        return;
    }
    let rows: Vec<Vec<String>> = sessions
        .iter()
        .map(|item| {
            vec![
                item.session.id.to_string(),
                item.session.name.clone(),
                item.session.filename.clone(),
                format!("{}/{}", item.counts.rated_count, item.counts.row_count),
                progress_bar(item.counts.progress_percent(), 10),
            ]
        })
        .collect();
    println!("{}", table(&["ID", "NAME", "FILE", "RATED", "PROGRESS"], &rows));
}

fn print_session(detail: &SessionDetail) {
    println!("{} ({})", detail.session.name, detail.session.id);
    println!("Project: {}", detail.project.name);
    println!("File:    {}", detail.session.filename);
    println!("Columns: {}", detail.session.columns.join(", "));
    println!(
        "Rated:   {}/{} {}",
        detail.counts.rated_count,
        detail.counts.row_count,
        progress_bar(detail.counts.progress_percent(), 10)
    );
}

fn print_rows(detail: &SessionDetail, rows: &PaginatedRows, api_url: &str) {
    println!(
        "Page {}/{} of {} rows ({} rated by you)\n",
        rows.page,
        rows.total_pages.max(1),
        rows.total,
        rows.rated_count
    );

    let table_rows: Vec<Vec<String>> = rows
        .items
        .iter()
        .map(|row| {
            let preview = parse_row_content(&row.content, &detail.session.columns, api_url)
                .into_iter()
                .next()
                .map(|cell| match cell.media {
                    Some(media) => format!("[{}] {}", media.kind.as_str(), media.url),
                    None => cell.value,
                })
                .unwrap_or_default();
            vec![
                (row.row_index + 1).to_string(),
                if row.is_rated() { "yes" } else { "" }.to_string(),
                row.ratings.len().to_string(),
                truncate(&preview, CELL_PREVIEW_CHARS),
            ]
        })
        .collect();
    println!("{}", table(&["ROW", "RATED", "RATINGS", "CONTENT"], &table_rows));
}

fn truncate(text: &str, max_chars: usize) -> String {
    let single_line = text.replace(['\n', '\r'], " ");
    if single_line.chars().count() > max_chars {
        let head: String = single_line.chars().take(max_chars).collect();
        format!("{head}...")
    } else {
        single_line
    }
}
