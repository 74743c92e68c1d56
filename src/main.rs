//! Foreman CLI entry point.

use clap::Parser;

use foreman::cli::{Cli, Commands};
use foreman::infrastructure::{config::ConfigLoader, logging};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match ConfigLoader::load() {
        Ok(config) => config,
        Err(err) => foreman::cli::handle_error(err, cli.json),
    };
    let _guard = match logging::init(&config.logging) {
        Ok(guard) => guard,
        Err(err) => foreman::cli::handle_error(err, cli.json),
    };

    let result = match cli.command {
        Commands::Plan(args) => foreman::cli::commands::plan::execute(args, cli.json).await,
    };

    if let Err(err) = result {
        foreman::cli::handle_error(err, cli.json);
    }
}
