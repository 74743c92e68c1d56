//! Command-line interface for inspecting plan manifests.

pub mod commands;
pub mod output;

use clap::{Parser, Subcommand};

/// Foreman: dependency-aware task orchestration with verified writes.
#[derive(Debug, Parser)]
#[command(name = "foreman", version, about)]
pub struct Cli {
    /// Emit machine-readable JSON instead of tables
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Inspect and validate plan manifests
    Plan(commands::plan::PlanArgs),
}

/// Print an error in the selected output format and exit non-zero.
pub fn handle_error(err: anyhow::Error, json: bool) -> ! {
    if json {
        let payload = serde_json::json!({ "error": format!("{err:#}") });
        eprintln!("{payload}");
    } else {
        eprintln!("Error: {err:#}");
    }
    std::process::exit(1);
}
