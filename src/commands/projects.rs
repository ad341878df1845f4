use anyhow::Result;

use hitl_desk::endpoints::projects::{ProjectCreate, ProjectUpdate, ProjectWithQuestions};

use super::{evaluation_from_args, App};
use crate::cli::ProjectsCommand;
use crate::commands::auth::print_projects;
use crate::commands::questions::print_questions;
use crate::output::{notify, progress_bar, table, Notice};

pub async fn run(command: ProjectsCommand, ctx: &mut App) -> Result<()> {
    match command {
        ProjectsCommand::List => {
            let projects = ctx.store.projects().await?;
            ctx.out.emit(&projects, |projects| {
                if projects.is_empty() {
                    println!("No projects yet.");
                }
                print_projects(projects);
            })
        }
        ProjectsCommand::Show { project } => {
            let project = ctx.store.project(project).await?;
            ctx.out.emit(&project, print_project)
        }
        ProjectsCommand::Create { name, description, evaluation, instructions, multi_questions } => {
            let mut request = ProjectCreate::new(&name);
            if let Some(config) = evaluation_from_args(&evaluation)? {
                request = request.with_evaluation(config);
            }
            request.description = description;
            request.instructions = instructions;
            request.use_multi_questions = multi_questions.then_some(true);

            let project = ctx.store.create_project(&request).await?;
            if ctx.out.is_json() {
                return ctx.out.json(&project);
            }
            notify(Notice::Success, &format!("Project {} created ({})", project.name, project.id));
            Ok(())
        }
        ProjectsCommand::Update { project, name, description, evaluation, instructions, multi_questions } => {
            let mut request = ProjectUpdate {
                name,
                description,
                instructions,
                use_multi_questions: multi_questions,
                ..Default::default()
            };
            if let Some(config) = evaluation_from_args(&evaluation)? {
                request = request.with_evaluation(config);
            }

            let updated = ctx.store.update_project(project, &request).await?;
            if ctx.out.is_json() {
                return ctx.out.json(&updated);
            }
            notify(Notice::Success, &format!("Project {} updated", updated.name));
            Ok(())
        }
        ProjectsCommand::Delete { project, yes } => {
            let details = ctx.store.project(project).await?;
            let question = format!(
                "Delete project {} with {} sessions and all their ratings?",
                details.project.name, details.stats.session_count
            );
            if !yes && !ctx.prompt.confirm(&question).await? {
                notify(Notice::Info, "Cancelled");
                return Ok(());
            }

            ctx.store.delete_project(project).await?;
            notify(Notice::Success, &format!("Project {} deleted", details.project.name));
            Ok(())
        }
        ProjectsCommand::Assign { project, raters } => {
            ctx.store.assign_raters(project, &raters).await?;
            notify(Notice::Success, &format!("Assigned {} rater(s)", raters.len()));
            Ok(())
        }
        ProjectsCommand::Unassign { project, rater } => {
            ctx.store.remove_rater(project, rater).await?;
            notify(Notice::Success, "Rater removed");
            Ok(())
        }
        ProjectsCommand::Raters => {
            let raters = ctx.store.raters().await?;
            ctx.out.emit(&raters, |raters| {
                let rows: Vec<Vec<String>> = raters
                    .iter()
                    .map(|r| vec![r.id.to_string(), r.username.clone()])
                    .collect();
                println!("{}", table(&["ID", "USERNAME"], &rows));
            })
        }
    }
}

fn print_project(details: &ProjectWithQuestions) {
    let project = &details.project;
    println!("{} ({})", project.name, project.id);
    if let Some(description) = project.description.as_deref().filter(|d| !d.is_empty()) {
        println!("{description}");
    }
    println!();

    if project.use_multi_questions {
        println!("Evaluation: {} question(s)", details.questions.len());
    } else {
        println!("Evaluation: {}", project.evaluation_type);
        println!("Config:     {}", project.evaluation_config);
    }
    println!(
        "Sessions:   {}    Rows rated: {}/{} {}",
        details.stats.session_count,
        details.stats.rated_rows,
        details.stats.total_rows,
        progress_bar(details.stats.progress_percent(), 10)
    );

    if let Some(instructions) = project.instructions.as_deref().filter(|i| !i.trim().is_empty()) {
        println!("\nInstructions:\n{instructions}");
    }

    if project.use_multi_questions {
        println!();
        print_questions(&details.questions);
    }

    println!("\nAssigned raters:");
    if details.assigned_raters.is_empty() {
        println!("  none");
    }
    for rater in &details.assigned_raters {
        println!("  {} ({})", rater.username, rater.id);
    }
}
