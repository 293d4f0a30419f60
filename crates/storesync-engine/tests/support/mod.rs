//! Shared test doubles for engine integration tests

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{Row, SqlitePool};

use storesync_engine::db::{RelationalStore, StoreError, StoreResult};
use storesync_engine::pipeline::JobSpec;
use storesync_engine::runner::{
    ActivityRun, PipelineRunner, RunFilter, RunState, RunStatus, RunnerError, RunnerResult,
};
use storesync_engine::search::{DataSourceRef, IndexSchema, SearchPublisher, SearchResult};

/// One scripted status observation, with an optional runner message.
pub type StatusStep = (RunStatus, Option<String>);

#[derive(Default)]
struct ScriptedInner {
    /// One script per expected submission, consumed in order. When the
    /// scripts run out, further submissions succeed immediately.
    scripts: VecDeque<Vec<StatusStep>>,
    active: HashMap<String, VecDeque<StatusStep>>,
    submissions: Vec<String>,
    cancelled: Vec<String>,
    stale_queued: Vec<String>,
    next_id: usize,
}

/// Pipeline runner double driven by per-submission status scripts.
///
/// The last step of a script repeats forever, so a trailing `InProgress`
/// models a run that never settles.
#[derive(Default)]
pub struct ScriptedRunner {
    inner: Mutex<ScriptedInner>,
}

impl ScriptedRunner {
    pub fn new(scripts: Vec<Vec<StatusStep>>) -> Self {
        Self {
            inner: Mutex::new(ScriptedInner {
                scripts: scripts.into_iter().collect(),
                ..Default::default()
            }),
        }
    }

    pub fn with_stale_queued(self, run_ids: &[&str]) -> Self {
        {
            let mut inner = self.inner.lock().unwrap();
            inner.stale_queued = run_ids.iter().map(|s| s.to_string()).collect();
        }
        self
    }

    /// Job names, in submission order.
    pub fn submissions(&self) -> Vec<String> {
        self.inner.lock().unwrap().submissions.clone()
    }

    /// Run ids cancelled, in order.
    pub fn cancelled(&self) -> Vec<String> {
        self.inner.lock().unwrap().cancelled.clone()
    }
}

/// Shorthand for a script of bare statuses.
pub fn steps(statuses: &[RunStatus]) -> Vec<StatusStep> {
    statuses.iter().map(|s| (*s, None)).collect()
}

#[async_trait]
impl PipelineRunner for ScriptedRunner {
    async fn submit(&self, spec: &JobSpec) -> RunnerResult<String> {
        let mut inner = self.inner.lock().unwrap();
        inner.next_id += 1;
        let run_id = format!("run-{}", inner.next_id);

        let script = inner
            .scripts
            .pop_front()
            .unwrap_or_else(|| steps(&[RunStatus::Succeeded]));
        inner.active.insert(run_id.clone(), script.into_iter().collect());
        inner.submissions.push(spec.name.clone());

        Ok(run_id)
    }

    async fn get_status(&self, run_id: &str) -> RunnerResult<RunState> {
        let mut inner = self.inner.lock().unwrap();
        let script = inner.active.get_mut(run_id).ok_or_else(|| RunnerError::Api {
            status: 404,
            message: format!("unknown run: {run_id}"),
        })?;

        let (status, message) = if script.len() > 1 {
            script.pop_front().ok_or_else(|| RunnerError::Api {
                status: 500,
                message: "empty script".to_string(),
            })?
        } else {
            script.front().cloned().ok_or_else(|| RunnerError::Api {
                status: 500,
                message: "empty script".to_string(),
            })?
        };

        Ok(RunState {
            run_id: run_id.to_string(),
            status,
            message,
            started_at: None,
        })
    }

    async fn cancel(&self, run_id: &str) -> RunnerResult<()> {
        self.inner.lock().unwrap().cancelled.push(run_id.to_string());
        Ok(())
    }

    async fn list_runs(&self, filter: &RunFilter) -> RunnerResult<Vec<RunState>> {
        let inner = self.inner.lock().unwrap();
        if filter.status != Some(RunStatus::Queued) {
            return Ok(Vec::new());
        }

        Ok(inner
            .stale_queued
            .iter()
            .map(|id| RunState {
                run_id: id.clone(),
                status: RunStatus::Queued,
                message: None,
                started_at: None,
            })
            .collect())
    }

    async fn activity_runs(&self, _run_id: &str) -> RunnerResult<Vec<ActivityRun>> {
        Ok(Vec::new())
    }
}

/// Recording store: captures statements, answers scalars from a fixed value,
/// and can be told to fail transactions.
#[derive(Default)]
pub struct MemoryStore {
    pub transactions: Mutex<Vec<Vec<String>>>,
    pub execs: Mutex<Vec<String>>,
    pub scalar_value: Mutex<i64>,
    pub fail_transactions: Mutex<bool>,
}

impl MemoryStore {
    pub fn with_scalar(value: i64) -> Self {
        Self {
            scalar_value: Mutex::new(value),
            ..Default::default()
        }
    }

    pub fn failing() -> Self {
        Self {
            fail_transactions: Mutex::new(true),
            ..Default::default()
        }
    }

    pub fn transaction_count(&self) -> usize {
        self.transactions.lock().unwrap().len()
    }
}

#[async_trait]
impl RelationalStore for MemoryStore {
    async fn exec(&self, sql: &str) -> StoreResult<u64> {
        self.execs.lock().unwrap().push(sql.to_string());
        Ok(1)
    }

    async fn scalar(&self, _sql: &str) -> StoreResult<i64> {
        Ok(*self.scalar_value.lock().unwrap())
    }

    async fn exec_transaction(&self, statements: &[String]) -> StoreResult<Vec<u64>> {
        if *self.fail_transactions.lock().unwrap() {
            return Err(StoreError::Config("injected transaction failure".to_string()));
        }
        self.transactions.lock().unwrap().push(statements.to_vec());
        Ok(vec![1; statements.len()])
    }
}

/// Search publisher double recording delete and create calls.
#[derive(Default)]
pub struct RecordingPublisher {
    pub deleted: Mutex<Vec<String>>,
    pub created: Mutex<Vec<(String, String)>>,
}

#[async_trait]
impl SearchPublisher for RecordingPublisher {
    async fn ensure_index_deleted(&self, name: &str) -> SearchResult<()> {
        self.deleted.lock().unwrap().push(name.to_string());
        Ok(())
    }

    async fn ensure_index_and_indexer_created(
        &self,
        schema: &IndexSchema,
        data_source: &DataSourceRef,
    ) -> SearchResult<()> {
        self.created
            .lock()
            .unwrap()
            .push((schema.name.clone(), data_source.table.clone()));
        Ok(())
    }
}

/// In-memory SQLite backend exercising the real merge SQL.
///
/// A single connection keeps every statement on the same in-memory database.
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub async fn in_memory() -> Self {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        Self { pool }
    }

    pub async fn setup(&self, statements: &[&str]) {
        for sql in statements {
            sqlx::query(sql).execute(&self.pool).await.unwrap();
        }
    }
}

#[async_trait]
impl RelationalStore for SqliteStore {
    async fn exec(&self, sql: &str) -> StoreResult<u64> {
        let result = sqlx::query(sql).execute(&self.pool).await?;
        Ok(result.rows_affected())
    }

    async fn scalar(&self, sql: &str) -> StoreResult<i64> {
        let row = sqlx::query(sql).fetch_one(&self.pool).await?;
        Ok(row.try_get::<i64, _>(0)?)
    }

    async fn exec_transaction(&self, statements: &[String]) -> StoreResult<Vec<u64>> {
        let mut tx = self.pool.begin().await?;
        let mut affected = Vec::with_capacity(statements.len());

        for sql in statements {
            let result = sqlx::query(sql).execute(&mut *tx).await?;
            affected.push(result.rows_affected());
        }

        tx.commit().await?;
        Ok(affected)
    }
}
