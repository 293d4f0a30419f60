//! StoreSync CLI
//!
//! Operator entry points for the orchestration engine:
//!
//! - `storesync seed`: upload sample source payloads to the blob store
//! - `storesync run`: execute one full orchestration session
//! - `storesync count`: report row counts per production and staging table
//! - `storesync search`: query the republished product search index

pub mod commands;
pub mod error;
pub mod records;

pub use error::{CliError, Result};

use clap::{Parser, Subcommand};

/// StoreSync - commerce data sync orchestrator
#[derive(Parser, Debug)]
#[command(name = "storesync")]
#[command(author, version, about, long_about = None)]
#[command(arg_required_else_help = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Upload sample source payloads to the blob store
    Seed,

    /// Run one full orchestration session over all entity kinds
    Run,

    /// Show row counts for production and staging tables
    Count,

    /// Query the product search index
    Search {
        /// Search text matched against the indexed product fields
        query: String,
    },
}
