mod auth;
mod examples;
mod media;
mod projects;
mod questions;
mod rate;
mod sessions;

use anyhow::{anyhow, bail, Context, Result};
use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};

use hitl_desk::endpoints::auth::{Role, User};
use hitl_desk::evaluation::{validate_config, EvaluationConfig, EvaluationType};
use hitl_desk::guard::{guard, AuthState, Navigation, Route};
use hitl_desk::{Config, Store};

use crate::cli::{Commands, EvaluationArgs};
use crate::output::Output;

/// Everything a command needs.
pub struct App {
    pub store: Store,
    pub config: Config,
    pub out: Output,
    pub prompt: Prompt,
}

pub async fn run(command: Commands, ctx: &mut App) -> Result<()> {
    match command {
        Commands::Login { username, password } => auth::login(ctx, &username, password).await,
        Commands::Register { username, role, password, confirm_password } => {
            auth::register(ctx, &username, role, password, confirm_password).await
        }
        Commands::Logout => auth::logout(ctx).await,
        Commands::Whoami => auth::whoami(ctx).await,
        Commands::Dashboard => auth::dashboard(ctx).await,
        Commands::Projects(command) => {
            require_role(ctx, Role::Requester).await?;
            projects::run(command, ctx).await
        }
        Commands::Questions(command) => {
            require_role(ctx, Role::Requester).await?;
            questions::run(command, ctx).await
        }
        Commands::Examples(command) => {
            require_role(ctx, Role::Requester).await?;
            examples::run(command, ctx).await
        }
        Commands::Sessions(command) => sessions::run(command, ctx).await,
        Commands::Media(command) => {
            require_role(ctx, Role::Requester).await?;
            media::run(command, ctx).await
        }
        Commands::Rate { session, per_page, filter } => {
            require_route(ctx, Route::Rate(session)).await?;
            let per_page = per_page.unwrap_or(ctx.config.per_page);
            rate::run(ctx, session, per_page, filter).await
        }
    }
}

// GUARDS

async fn auth_state(ctx: &App) -> Result<AuthState> {
    Ok(AuthState::from_lookup(ctx.store.current_user().await)?)
}

/// Resolve the route guard for a command, failing unless the page would render.
pub async fn require_route(ctx: &App, route: Route) -> Result<User> {
    let state = auth_state(ctx).await?;
    match (guard(route, &state), state) {
        (Navigation::Render, AuthState::Authenticated(user)) => Ok(user),
        (Navigation::Redirect(Route::Login), _) => bail!("Not logged in. Run `hitl login <username>` first."),
        (Navigation::Redirect(_), AuthState::Authenticated(user)) => {
            bail!("`{}` is not available to {} accounts", route, user.role)
        }
        _ => bail!("Not logged in. Run `hitl login <username>` first."),
    }
}

pub async fn require_role(ctx: &App, role: Role) -> Result<User> {
    let route = match role {
        Role::Requester => Route::RequesterDashboard,
        Role::Rater => Route::RaterDashboard,
    };
    let state = auth_state(ctx).await?;
    match (guard(route, &state), state) {
        (Navigation::Render, AuthState::Authenticated(user)) => Ok(user),
        (_, AuthState::Authenticated(user)) => {
            bail!("This command needs a {role} account; you are logged in as {} ({})", user.username, user.role)
        }
        _ => bail!("Not logged in. Run `hitl login <username>` first."),
    }
}

// INPUT

/// Line-based stdin shared by prompts and the rating desk.
pub struct Prompt {
    lines: Lines<BufReader<Stdin>>,
}

impl Prompt {
    pub fn new() -> Self {
        Self {
            lines: BufReader::new(tokio::io::stdin()).lines(),
        }
    }

    /// Print `question` and read one line. `None` at end of input.
    pub async fn ask(&mut self, question: &str) -> Result<Option<String>> {
        eprint!("{question}");
        std::io::stderr().flush().context("writing prompt")?;
        let line = self.lines.next_line().await.context("reading stdin")?;
        Ok(line.map(|l| l.trim_end_matches('\r').to_string()))
    }

    pub async fn require(&mut self, question: &str) -> Result<String> {
        self.ask(question)
            .await?
            .ok_or_else(|| anyhow!("input ended before `{}` was answered", question.trim()))
    }

    pub async fn confirm(&mut self, question: &str) -> Result<bool> {
        let answer = self.ask(&format!("{question} [y/N] ")).await?;
        Ok(matches!(answer.as_deref().map(str::trim), Some("y" | "Y" | "yes" | "Yes")))
    }
}

// SHARED PARSING

/// Build an evaluation config from `--type`/`--config`, validated.
pub fn evaluation_from_args(args: &EvaluationArgs) -> Result<Option<EvaluationConfig>> {
    let kind = match (args.evaluation_type, &args.config) {
        (None, None) => return Ok(None),
        (None, Some(_)) => bail!("--config needs --type"),
        (Some(kind), _) => kind,
    };

    let config = match &args.config {
        Some(raw) => parse_config(kind, raw)?,
        None => EvaluationConfig::default_for(kind),
    };
    validate_config(&config)?;
    Ok(Some(config))
}

fn parse_config(kind: EvaluationType, raw: &str) -> Result<EvaluationConfig> {
    let value: serde_json::Value = serde_json::from_str(raw).context("--config is not valid JSON")?;
    EvaluationConfig::decode(kind, &value).with_context(|| format!("--config does not fit a {kind} evaluation"))
}
