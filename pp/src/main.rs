//! PlanPilot - prompt-to-action planner
//!
//! CLI entry point: serve the HTTP API or run the planning pipeline once.

use std::sync::Arc;

use clap::Parser;
use eyre::{Context, Result};
use tracing::info;

use planpilot::cli::{Cli, Command};
use planpilot::config::Config;
use planpilot::server::{self, AppState};

fn setup_logging(verbose: bool) -> Result<()> {
    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()),
        )
        .init();

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose).context("Failed to setup logging")?;

    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;

    info!(
        "PlanPilot loaded config: provider={}, model={}",
        config.llm.provider, config.llm.model
    );

    match cli.command {
        Some(Command::Serve { bind }) => cmd_serve(&config, bind).await,
        Some(Command::Plan { input }) => cmd_plan(&config, &input).await,
        None => {
            use clap::CommandFactory;
            Cli::command().print_help()?;
            Ok(())
        }
    }
}

/// Run the HTTP API server
async fn cmd_serve(config: &Config, bind: Option<String>) -> Result<()> {
    let state = Arc::new(AppState::from_config(config));
    let bind = bind.unwrap_or_else(|| config.server.bind.clone());

    server::serve(state, &bind).await
}

/// Run the planning pipeline once and print the plan as JSON
async fn cmd_plan(config: &Config, input: &str) -> Result<()> {
    let state = AppState::from_config(config);

    let (plan, fallback) = match state.generator.plan(input).await {
        Ok(plan) => (plan, None),
        Err(e) => (state.mock.plan(input), Some(e.to_string())),
    };

    let mut output = serde_json::to_value(&plan).context("Failed to serialize plan")?;
    if let Some(reason) = fallback {
        output["_fallback"] = serde_json::json!("mock");
        output["_ai_error"] = serde_json::json!(reason);
    }

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
