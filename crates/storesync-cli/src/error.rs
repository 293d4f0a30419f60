//! CLI error types

use thiserror::Error;

/// Errors surfaced to the operator by CLI commands
#[derive(Error, Debug)]
pub enum CliError {
    /// Configuration could not be loaded or validated
    #[error("Configuration error: {0}")]
    Config(#[source] anyhow::Error),

    /// Relational store failure
    #[error(transparent)]
    Store(#[from] storesync_engine::db::StoreError),

    /// Pipeline runner failure
    #[error(transparent)]
    Runner(#[from] storesync_engine::runner::RunnerError),

    /// Search service failure
    #[error(transparent)]
    Search(#[from] storesync_engine::search::SearchError),

    /// Payload serialization failure
    #[error("Failed to serialize payload: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Anything else, with context attached
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, CliError>;
