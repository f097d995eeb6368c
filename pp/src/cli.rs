//! CLI command definitions

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// PlanPilot - prompt-to-action planner with human confirmation
#[derive(Parser)]
#[command(
    name = "pp",
    about = "Prompt-to-action planner: LLM planning with validation, repair, and confirmed execution",
    version
)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, help = "Path to config file")]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true, help = "Enable verbose output")]
    pub verbose: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// CLI subcommands
#[derive(Subcommand)]
pub enum Command {
    /// Start the HTTP API server
    Serve {
        /// Bind address (overrides config)
        #[arg(short, long)]
        bind: Option<String>,
    },

    /// Plan a single input and print the result (for development/testing)
    Plan {
        /// The free-text input to plan
        input: String,
    },
}
