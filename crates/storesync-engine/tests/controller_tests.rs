//! Run controller lifecycle tests with a scripted runner

mod support;

use std::sync::Arc;
use std::time::Duration;

use storesync_engine::controller::{ControllerConfig, RunController, RunOutcome};
use storesync_engine::entity::EntityKind;
use storesync_engine::runner::RunStatus;
use storesync_engine::sync::SyncResult;

use support::{steps, MemoryStore, ScriptedRunner};

fn fast_config() -> ControllerConfig {
    ControllerConfig {
        poll_interval: Duration::from_millis(1),
        run_timeout: Duration::from_secs(5),
        max_queued_retries: 3,
    }
}

fn controller(runner: Arc<ScriptedRunner>, store: Arc<MemoryStore>) -> RunController {
    RunController::new(runner, store, fast_config())
}

#[tokio::test]
async fn successful_run_dispatches_the_merge_transaction() {
    let runner = Arc::new(ScriptedRunner::new(vec![steps(&[RunStatus::Succeeded])]));
    let store = Arc::new(MemoryStore::default());
    let controller = controller(runner.clone(), store.clone());

    let outcome = controller.run_and_sync(EntityKind::Category).await.unwrap();

    assert_eq!(
        outcome,
        RunOutcome::Synced(SyncResult {
            rows_inserted: 1,
            rows_merged: 1,
        })
    );
    let transactions = store.transactions.lock().unwrap();
    assert_eq!(transactions.len(), 1);
    assert_eq!(transactions[0].len(), 3);
    assert!(transactions[0][2].contains("DELETE FROM categories_staging"));
}

#[tokio::test]
async fn run_settles_after_several_polls() {
    let runner = Arc::new(ScriptedRunner::new(vec![steps(&[
        RunStatus::InProgress,
        RunStatus::InProgress,
        RunStatus::Succeeded,
    ])]));
    let store = Arc::new(MemoryStore::default());
    let controller = controller(runner.clone(), store.clone());

    let outcome = controller.run_and_sync(EntityKind::Product).await.unwrap();

    assert!(matches!(outcome, RunOutcome::Synced(_)));
    assert_eq!(store.transaction_count(), 1);
}

#[tokio::test]
async fn failed_run_reports_reason_and_skips_merge() {
    let runner = Arc::new(ScriptedRunner::new(vec![vec![(
        RunStatus::Failed,
        Some("boom".to_string()),
    )]]));
    let store = Arc::new(MemoryStore::default());
    let controller = controller(runner.clone(), store.clone());

    let outcome = controller.run_and_sync(EntityKind::Order).await.unwrap();

    assert_eq!(outcome, RunOutcome::Failed("boom".to_string()));
    assert_eq!(store.transaction_count(), 0);
}

#[tokio::test]
async fn failed_run_without_message_gets_a_default_reason() {
    let runner = Arc::new(ScriptedRunner::new(vec![steps(&[RunStatus::Failed])]));
    let store = Arc::new(MemoryStore::default());
    let controller = controller(runner, store);

    let outcome = controller.run_and_sync(EntityKind::Order).await.unwrap();

    assert_eq!(outcome, RunOutcome::Failed("pipeline run failed".to_string()));
}

#[tokio::test]
async fn queued_run_is_cancelled_and_resubmitted() {
    let runner = Arc::new(ScriptedRunner::new(vec![
        steps(&[RunStatus::Queued]),
        steps(&[RunStatus::Succeeded]),
    ]));
    let store = Arc::new(MemoryStore::default());
    let controller = controller(runner.clone(), store.clone());

    let outcome = controller.run_and_sync(EntityKind::Category).await.unwrap();

    assert!(matches!(outcome, RunOutcome::Synced(_)));
    assert_eq!(runner.submissions().len(), 2);
    assert_eq!(runner.cancelled(), vec!["run-1".to_string()]);
}

#[tokio::test]
async fn queued_retries_are_bounded() {
    let runner = Arc::new(ScriptedRunner::new(vec![
        steps(&[RunStatus::Queued]),
        steps(&[RunStatus::Queued]),
        steps(&[RunStatus::Queued]),
    ]));
    let store = Arc::new(MemoryStore::default());
    let config = ControllerConfig {
        max_queued_retries: 2,
        ..fast_config()
    };
    let controller = RunController::new(runner.clone(), store.clone(), config);

    let outcome = controller.run_and_sync(EntityKind::Category).await.unwrap();

    assert_eq!(outcome, RunOutcome::Failed("exceeded retry limit".to_string()));
    assert_eq!(runner.submissions().len(), 3);
    // Every submission is cancelled, the exhausted last run included.
    assert_eq!(
        runner.cancelled(),
        vec!["run-1".to_string(), "run-2".to_string(), "run-3".to_string()]
    );
    assert_eq!(store.transaction_count(), 0);
}

#[tokio::test]
async fn run_that_never_settles_times_out() {
    let runner = Arc::new(ScriptedRunner::new(vec![steps(&[RunStatus::InProgress])]));
    let store = Arc::new(MemoryStore::default());
    let config = ControllerConfig {
        poll_interval: Duration::from_millis(5),
        run_timeout: Duration::from_millis(20),
        max_queued_retries: 3,
    };
    let controller = RunController::new(runner.clone(), store.clone(), config);

    let outcome = controller.run_and_sync(EntityKind::Product).await.unwrap();

    assert_eq!(outcome, RunOutcome::Failed("timeout".to_string()));
    // The abandoned run is cancelled best effort.
    assert_eq!(runner.cancelled(), vec!["run-1".to_string()]);
    assert_eq!(store.transaction_count(), 0);
}

#[tokio::test]
async fn merge_failure_after_success_folds_into_outcome() {
    let runner = Arc::new(ScriptedRunner::new(vec![steps(&[RunStatus::Succeeded])]));
    let store = Arc::new(MemoryStore::failing());
    let controller = controller(runner, store);

    let outcome = controller.run_and_sync(EntityKind::Category).await.unwrap();

    match outcome {
        RunOutcome::Failed(reason) => assert!(reason.contains("merge sync failed")),
        other => panic!("expected merge failure, got {other:?}"),
    }
}

#[tokio::test]
async fn cancelled_run_is_reported_as_cancelled() {
    let runner = Arc::new(ScriptedRunner::new(vec![steps(&[RunStatus::Cancelled])]));
    let store = Arc::new(MemoryStore::default());
    let controller = controller(runner, store.clone());

    let outcome = controller.run_and_sync(EntityKind::Order).await.unwrap();

    assert_eq!(outcome, RunOutcome::Cancelled);
    assert_eq!(store.transaction_count(), 0);
}

#[tokio::test]
async fn stale_queued_runs_are_cancelled_at_session_start() {
    let runner = Arc::new(
        ScriptedRunner::new(Vec::new()).with_stale_queued(&["zombie-1", "zombie-2"]),
    );
    let store = Arc::new(MemoryStore::default());
    let controller = controller(runner.clone(), store);

    let cancelled = controller.cancel_stale_queued_runs().await.unwrap();

    assert_eq!(cancelled, 2);
    assert_eq!(
        runner.cancelled(),
        vec!["zombie-1".to_string(), "zombie-2".to_string()]
    );
}
