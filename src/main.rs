mod cli;
mod commands;
mod output;

use anyhow::{Context, Result};
use clap::Parser;
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use hitl_desk::desk::DeskError;
use hitl_desk::{ApiClient, ApiError, Config, Store};

use cli::Cli;
use commands::{App, Prompt};
use output::{notify, Notice, Output};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(&cli);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            report(&e);
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(cli: &Cli) {
    let filter = if cli.verbose {
        EnvFilter::new("hitl=debug,hitl_desk=debug")
    } else if cli.quiet {
        EnvFilter::new("error")
    } else {
        EnvFilter::try_from_env("HITL_LOG").unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> Result<()> {
    let mut config = Config::from_env().context("loading configuration")?;
    if let Some(api_url) = &cli.api_url {
        config = config.with_api_url(api_url);
    }
    debug!(api_url = %config.api_url, "starting");

    let client = ApiClient::new(&config)?;
    let mut app = App {
        store: Store::new(client),
        config,
        out: Output::new(cli.json),
        prompt: Prompt::new(),
    };

    commands::run(cli.command, &mut app).await
}

fn report(error: &anyhow::Error) {
    match api_error(error) {
        Some(api) if api.requires_login() => {
            notify(Notice::Error, "Your session has expired. Run `hitl login <username>` again.");
        }
        Some(api) => notify(Notice::Error, &api.message()),
        None => notify(Notice::Error, &format!("{error:#}")),
    }
}

/// The API failure behind an error, also when the rating desk wrapped it.
fn api_error(error: &anyhow::Error) -> Option<&ApiError> {
    error.chain().find_map(|cause| {
        cause.downcast_ref::<ApiError>().or_else(|| match cause.downcast_ref::<DeskError>() {
            Some(DeskError::Api(api)) => Some(api),
            _ => None,
        })
    })
}
