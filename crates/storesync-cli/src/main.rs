//! StoreSync CLI - Main entry point

use clap::Parser;
use std::process;
use storesync_cli::{commands, Cli, CliError, Commands};
use storesync_common::logging::{init_logging, LogConfig, LogLevel};
use storesync_engine::Config;
use tracing::error;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let mut log_config = LogConfig::from_env();
    if cli.verbose {
        log_config.level = LogLevel::Debug;
    }

    // CLI output still works without a subscriber installed.
    let _ = init_logging(&log_config);

    if let Err(e) = execute_command(&cli).await {
        error!(error = %e, "Command failed");
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

async fn execute_command(cli: &Cli) -> storesync_cli::Result<()> {
    let config = Config::load().map_err(CliError::Config)?;

    match cli.command {
        Commands::Seed => commands::seed::run(&config).await,
        Commands::Run => commands::run::run(&config).await,
        Commands::Count => commands::count::run(&config).await,
        Commands::Search { ref query } => commands::search::run(&config, query).await,
    }
}
