//! Pipeline runner contract
//!
//! The external service that executes data-movement jobs: submit a job spec,
//! poll run status, cancel runs, and fetch activity diagnostics. The REST
//! implementation lives in [`http`]; tests script the trait directly.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::pipeline::JobSpec;

pub mod http;

pub use http::{HttpPipelineRunner, RunnerConfig};

/// Result type alias for runner operations
pub type RunnerResult<T> = Result<T, RunnerError>;

/// Failures talking to the pipeline runner service
#[derive(Error, Debug)]
pub enum RunnerError {
    #[error("Runner request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Runner API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Runner reported unknown run status: {0}")]
    UnknownStatus(String),
}

/// Status vocabulary reported by the runner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunStatus {
    Queued,
    InProgress,
    Succeeded,
    Failed,
    Cancelled,
}

impl RunStatus {
    /// Whether the run can make no further progress.
    ///
    /// `Queued` is deliberately not terminal: a run observed as queued after
    /// the poll loop exits is handled by the cancel-and-resubmit policy, not
    /// treated as an outcome.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            RunStatus::Succeeded | RunStatus::Failed | RunStatus::Cancelled
        )
    }
}

impl std::str::FromStr for RunStatus {
    type Err = RunnerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Queued" => Ok(RunStatus::Queued),
            "InProgress" => Ok(RunStatus::InProgress),
            "Succeeded" => Ok(RunStatus::Succeeded),
            "Failed" => Ok(RunStatus::Failed),
            "Cancelled" => Ok(RunStatus::Cancelled),
            other => Err(RunnerError::UnknownStatus(other.to_string())),
        }
    }
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            RunStatus::Queued => "Queued",
            RunStatus::InProgress => "InProgress",
            RunStatus::Succeeded => "Succeeded",
            RunStatus::Failed => "Failed",
            RunStatus::Cancelled => "Cancelled",
        };
        f.write_str(s)
    }
}

/// Snapshot of one run, as reported by the runner.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunState {
    pub run_id: String,
    pub status: RunStatus,
    /// Runner-reported error or progress message, when present.
    pub message: Option<String>,
    pub started_at: Option<DateTime<Utc>>,
}

/// Filter for listing runs.
#[derive(Debug, Clone, Default)]
pub struct RunFilter {
    pub status: Option<RunStatus>,
    pub job_name: Option<String>,
}

/// One activity execution inside a run; diagnostics only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityRun {
    pub name: String,
    pub status: String,
    #[serde(default)]
    pub output: Option<serde_json::Value>,
    #[serde(default)]
    pub error: Option<String>,
}

/// External pipeline runner.
#[async_trait]
pub trait PipelineRunner: Send + Sync {
    /// Create and trigger a run for the job spec; returns the run id.
    async fn submit(&self, spec: &JobSpec) -> RunnerResult<String>;

    /// Fetch the current state of a run.
    async fn get_status(&self, run_id: &str) -> RunnerResult<RunState>;

    /// Cancel a single run. Must not affect other in-flight runs.
    async fn cancel(&self, run_id: &str) -> RunnerResult<()>;

    /// List runs matching the filter.
    async fn list_runs(&self, filter: &RunFilter) -> RunnerResult<Vec<RunState>>;

    /// Fetch activity-level diagnostics for a run.
    async fn activity_runs(&self, run_id: &str) -> RunnerResult<Vec<ActivityRun>>;
}
