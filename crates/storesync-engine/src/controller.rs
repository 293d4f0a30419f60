//! Pipeline run controller
//!
//! Owns one run lifecycle per entity kind: submit the job, poll until the
//! run settles, apply the cancel-and-resubmit policy for runs stuck in the
//! queue, and hand successful runs to the merge engine. Failures fold into
//! the returned [`RunOutcome`]; only connectivity failures against the
//! runner itself propagate as [`RunnerError`].

use std::sync::Arc;
use std::time::Duration;

use tokio::time::{sleep, Instant};
use tracing::{debug, error, info, warn};

use crate::db::RelationalStore;
use crate::entity::EntityKind;
use crate::pipeline;
use crate::runner::{PipelineRunner, RunFilter, RunState, RunStatus, RunnerResult};
use crate::sync::{MergeSync, SyncResult};

/// Fixed backoff between status polls, matching the runner's expected
/// seconds-to-minutes run durations.
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 3;

/// Wall-clock ceiling per run before it is abandoned as timed out.
pub const DEFAULT_RUN_TIMEOUT_SECS: u64 = 900;

/// How many times a queued run is cancelled and resubmitted before giving up.
pub const DEFAULT_MAX_QUEUED_RETRIES: u32 = 3;

/// Tunables for the poll loop and retry policy.
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    pub poll_interval: Duration,
    pub run_timeout: Duration,
    pub max_queued_retries: u32,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(DEFAULT_POLL_INTERVAL_SECS),
            run_timeout: Duration::from_secs(DEFAULT_RUN_TIMEOUT_SECS),
            max_queued_retries: DEFAULT_MAX_QUEUED_RETRIES,
        }
    }
}

/// Result of one run-and-sync attempt for an entity kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// The run succeeded and the staging table was merged into production.
    Synced(SyncResult),
    /// The run or the follow-up merge failed; the reason is operator-facing.
    Failed(String),
    /// The run was cancelled out from under the controller.
    Cancelled,
}

/// Drives pipeline runs and dispatches the merge on success.
pub struct RunController {
    runner: Arc<dyn PipelineRunner>,
    merge: MergeSync,
    config: ControllerConfig,
}

impl RunController {
    pub fn new(
        runner: Arc<dyn PipelineRunner>,
        store: Arc<dyn RelationalStore>,
        config: ControllerConfig,
    ) -> Self {
        Self {
            runner,
            merge: MergeSync::new(store),
            config,
        }
    }

    /// Run the data-movement job for `kind` and merge staging into
    /// production once it succeeds.
    pub async fn run_and_sync(&self, kind: EntityKind) -> RunnerResult<RunOutcome> {
        let spec = pipeline::build_job_spec(kind);
        let mut queued_retries = 0u32;

        loop {
            let run_id = self.runner.submit(&spec).await?;
            info!(entity = %kind, run_id = %run_id, job = %spec.name, "Pipeline run submitted");

            let settled = match self.poll_until_settled(kind, &run_id).await? {
                Some(state) => state,
                None => {
                    // Timed out while still in progress; best effort cancel.
                    warn!(entity = %kind, run_id = %run_id, "Pipeline run timed out");
                    if let Err(e) = self.runner.cancel(&run_id).await {
                        warn!(run_id = %run_id, error = %e, "Failed to cancel timed-out run");
                    }
                    return Ok(RunOutcome::Failed("timeout".to_string()));
                },
            };

            match settled.status {
                RunStatus::Succeeded => {
                    self.report_diagnostics(kind, &run_id).await;
                    return Ok(self.dispatch_sync(kind, &run_id).await);
                },
                RunStatus::Queued => {
                    // The runner accepted the run but a stale run is holding
                    // the slot. Cancel this run id and submit a fresh one,
                    // bounded so a jammed queue cannot loop forever.
                    if queued_retries >= self.config.max_queued_retries {
                        warn!(
                            entity = %kind,
                            run_id = %run_id,
                            retries = queued_retries,
                            "Run still queued after retry budget exhausted"
                        );
                        // Best effort; don't leave the last run queued.
                        if let Err(e) = self.runner.cancel(&run_id).await {
                            warn!(run_id = %run_id, error = %e, "Failed to cancel exhausted queued run");
                        }
                        return Ok(RunOutcome::Failed("exceeded retry limit".to_string()));
                    }
                    queued_retries += 1;
                    info!(
                        entity = %kind,
                        run_id = %run_id,
                        attempt = queued_retries,
                        "Run stuck in queue; cancelling and resubmitting"
                    );
                    self.runner.cancel(&run_id).await?;
                },
                RunStatus::Failed => {
                    let reason = settled
                        .message
                        .unwrap_or_else(|| "pipeline run failed".to_string());
                    self.report_diagnostics(kind, &run_id).await;
                    error!(entity = %kind, run_id = %run_id, reason = %reason, "Pipeline run failed");
                    return Ok(RunOutcome::Failed(reason));
                },
                RunStatus::Cancelled => {
                    warn!(entity = %kind, run_id = %run_id, "Pipeline run was cancelled");
                    return Ok(RunOutcome::Cancelled);
                },
                RunStatus::InProgress => {
                    // poll_until_settled never returns an in-progress state.
                    unreachable!("poll loop returned InProgress as settled");
                },
            }
        }
    }

    /// Cancel every run the runner still reports as queued.
    ///
    /// Called once at session start to clear garbage left over from a
    /// previous aborted session; returns the number of runs cancelled.
    pub async fn cancel_stale_queued_runs(&self) -> RunnerResult<usize> {
        let filter = RunFilter {
            status: Some(RunStatus::Queued),
            job_name: None,
        };

        let stale = self.runner.list_runs(&filter).await?;
        for run in &stale {
            info!(run_id = %run.run_id, "Cancelling stale queued run");
            self.runner.cancel(&run.run_id).await?;
        }

        Ok(stale.len())
    }

    /// Poll the run until it reports anything other than `InProgress`.
    ///
    /// Returns `None` when the wall-clock timeout elapses first.
    async fn poll_until_settled(
        &self,
        kind: EntityKind,
        run_id: &str,
    ) -> RunnerResult<Option<RunState>> {
        let deadline = Instant::now() + self.config.run_timeout;

        loop {
            let state = self.runner.get_status(run_id).await?;
            info!(entity = %kind, run_id = %run_id, status = %state.status, "Pipeline run status");

            if state.status != RunStatus::InProgress {
                return Ok(Some(state));
            }
            if Instant::now() >= deadline {
                return Ok(None);
            }

            sleep(self.config.poll_interval).await;
        }
    }

    /// Log activity diagnostics for observability. Non-fatal if unavailable.
    async fn report_diagnostics(&self, kind: EntityKind, run_id: &str) {
        match self.runner.activity_runs(run_id).await {
            Ok(activities) => {
                for activity in activities {
                    match &activity.error {
                        Some(err) => warn!(
                            entity = %kind,
                            run_id = %run_id,
                            activity = %activity.name,
                            error = %err,
                            "Activity reported an error"
                        ),
                        None => debug!(
                            entity = %kind,
                            run_id = %run_id,
                            activity = %activity.name,
                            status = %activity.status,
                            output = ?activity.output,
                            "Activity diagnostics"
                        ),
                    }
                }
            },
            Err(e) => {
                warn!(run_id = %run_id, error = %e, "Activity diagnostics unavailable");
            },
        }
    }

    async fn dispatch_sync(&self, kind: EntityKind, run_id: &str) -> RunOutcome {
        match self.merge.sync(kind).await {
            Ok(result) => RunOutcome::Synced(result),
            Err(e) => {
                error!(
                    entity = %kind,
                    run_id = %run_id,
                    error = %e,
                    "Merge sync failed after successful run"
                );
                RunOutcome::Failed(format!("merge sync failed: {e}"))
            },
        }
    }
}
