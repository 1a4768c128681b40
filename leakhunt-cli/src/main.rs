mod args;
mod console;

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use leakhunt_core::config::LeakhuntConfig;
use leakhunt_core::orchestrator::{Orchestrator, RunOutcome, Termination};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use args::Args;
use console::ConsoleEvents;

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match run(args).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::from(1)
        }
    }
}

async fn run(args: Args) -> Result<ExitCode> {
    let mut config = LeakhuntConfig::load_default();
    config.expand_env_vars();
    if config.github.token.is_none() {
        warn!("GITHUB_TOKEN is not set; code search will be rate limited");
    }

    let orchestrator = Orchestrator::from_config(&config)
        .context("Failed to set up the orchestrator")?
        .with_events(Arc::new(ConsoleEvents));

    let cancel = CancellationToken::new();
    let ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("interrupt received, cancelling run");
            ctrl_c.cancel();
        }
    });

    let outcome = orchestrator.run_with_cancel(&args.request(), cancel).await;
    for execution in &outcome.tool_executions {
        info!("{}", ConsoleEvents::render_execution(execution));
    }
    Ok(exit_code(outcome))
}

fn exit_code(outcome: RunOutcome) -> ExitCode {
    match outcome.termination {
        Termination::Completed => ExitCode::SUCCESS,
        Termination::BudgetExceeded { max_turns } => {
            eprintln!(
                "Run incomplete: turn budget of {} exhausted after {} turns",
                max_turns, outcome.turns
            );
            ExitCode::from(2)
        }
        Termination::Failed(error) => {
            eprintln!("Error: {}", error);
            ExitCode::from(1)
        }
    }
}
