use anyhow::{bail, Result};

use hitl_desk::endpoints::auth::{validate_login, LoginCredentials, RegisterCredentials, Role};
use hitl_desk::endpoints::projects::ProjectListItem;
use hitl_desk::guard::{guard_path, AuthState, Navigation, Route};

use super::App;
use crate::output::{notify, progress_bar, table, Notice};

pub async fn login(ctx: &mut App, username: &str, password: Option<String>) -> Result<()> {
    let password = match password {
        Some(password) => password,
        None => ctx.prompt.require("Password: ").await?,
    };

    let credentials = LoginCredentials {
        username: username.trim().to_string(),
        password,
    };
    validate_login(&credentials)?;

    let response = ctx.store.login(&credentials).await?;
    if ctx.out.is_json() {
        return ctx.out.json(&response.user);
    }
    notify(
        Notice::Success,
        &format!("Logged in as {} ({})", response.user.username, response.user.role),
    );
    Ok(())
}

pub async fn register(
    ctx: &mut App,
    username: &str,
    role: Role,
    password: Option<String>,
    confirm: Option<String>,
) -> Result<()> {
    let password = match password {
        Some(password) => password,
        None => ctx.prompt.require("Password: ").await?,
    };
    let confirm = match confirm {
        Some(confirm) => confirm,
        None => ctx.prompt.require("Confirm password: ").await?,
    };

    let credentials = RegisterCredentials {
        username: username.trim().to_string(),
        password,
        role,
    };
    let user = ctx.store.register(&credentials, &confirm).await?;

    if ctx.out.is_json() {
        return ctx.out.json(&user);
    }
    notify(
        Notice::Success,
        &format!("Account {} created. Run `hitl login {}` to sign in.", user.username, user.username),
    );
    Ok(())
}

pub async fn logout(ctx: &mut App) -> Result<()> {
    ctx.store.logout().await?;
    notify(Notice::Success, "Logged out");
    Ok(())
}

pub async fn whoami(ctx: &mut App) -> Result<()> {
    let user = ctx.store.current_user().await?;
    ctx.out.emit(&user, |user| {
        println!("{} ({})", user.username, user.role);
        println!("id: {}", user.id);
    })
}

/// The `/dashboard` page: whichever dashboard the guard sends this user to.
pub async fn dashboard(ctx: &mut App) -> Result<()> {
    let state = AuthState::from_lookup(ctx.store.current_user().await)?;
    let route = match guard_path("/dashboard", &state) {
        Navigation::Redirect(route) => route,
        Navigation::Render | Navigation::Wait => Route::Login,
    };

    let projects = match route {
        Route::Login => bail!("Not logged in. Run `hitl login <username>` first."),
        _ => ctx.store.projects().await?,
    };
    if ctx.out.is_json() {
        return ctx.out.json(&projects);
    }

    match route {
        Route::RequesterDashboard => {
            println!("Your projects\n");
            print_projects(&projects);
            if projects.is_empty() {
                println!("No projects yet. Create one with `hitl projects create <name>`.");
            }
        }
        _ => {
            println!("Assigned projects\n");
            print_projects(&projects);
            if projects.is_empty() {
                println!("No projects are assigned to you yet.");
            } else {
                println!("\nPick a session with `hitl sessions list <project>`, then `hitl rate <session>`.");
            }
        }
    }
    Ok(())
}

pub fn print_projects(projects: &[ProjectListItem]) {
    if projects.is_empty() {
        return;
    }
    let rows: Vec<Vec<String>> = projects
        .iter()
        .map(|item| {
            vec![
                item.project.id.to_string(),
                item.project.name.clone(),
                item.project.evaluation_type.to_string(),
                item.stats.session_count.to_string(),
                format!("{}/{}", item.stats.rated_rows, item.stats.total_rows),
                progress_bar(item.stats.progress_percent(), 10),
            ]
        })
        .collect();
    println!("{}", table(&["ID", "NAME", "TYPE", "SESSIONS", "RATED", "PROGRESS"], &rows));
}
