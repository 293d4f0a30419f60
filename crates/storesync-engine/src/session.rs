//! Full orchestration session
//!
//! One session drives every entity kind through its pipeline run and merge,
//! in dependency order, then republishes the product search index when the
//! production products table has rows. Kinds whose dependencies did not sync
//! are skipped rather than run against stale parents.

use std::collections::HashSet;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::controller::{RunController, RunOutcome};
use crate::db::RelationalStore;
use crate::entity::EntityKind;
use crate::search::{product_index_schema, DataSourceRef, SearchPublisher};

/// Search resources the session republishes after a successful sync.
#[derive(Debug, Clone)]
pub struct SearchTarget {
    pub index_name: String,
    pub data_source_name: String,
    /// Production table the data source reads from.
    pub table: String,
}

impl Default for SearchTarget {
    fn default() -> Self {
        Self {
            index_name: "product-sql-idx".to_string(),
            data_source_name: "product-sql-ds".to_string(),
            table: "products".to_string(),
        }
    }
}

/// Per-kind outcomes of one session, plus whether search was republished.
#[derive(Debug)]
pub struct SessionSummary {
    pub outcomes: Vec<(EntityKind, RunOutcome)>,
    pub search_republished: bool,
}

impl SessionSummary {
    pub fn all_synced(&self) -> bool {
        self.outcomes
            .iter()
            .all(|(_, outcome)| matches!(outcome, RunOutcome::Synced(_)))
    }

    /// Operator-facing summary, one line per entity kind.
    pub fn render(&self) -> String {
        let mut lines = Vec::with_capacity(self.outcomes.len() + 1);

        for (kind, outcome) in &self.outcomes {
            let line = match outcome {
                RunOutcome::Synced(result) => format!(
                    "  ✓ {kind}: {} inserted, {} merged",
                    result.rows_inserted, result.rows_merged
                ),
                RunOutcome::Failed(reason) => format!("  ✗ {kind}: failed ({reason})"),
                RunOutcome::Cancelled => format!("  ✗ {kind}: cancelled"),
            };
            lines.push(line);
        }

        lines.push(if self.search_republished {
            "  ✓ product search index republished".to_string()
        } else {
            "  - product search index left unchanged".to_string()
        });

        lines.join("\n")
    }
}

/// Drives one end-to-end sync pass over all entity kinds.
pub struct EtlSession {
    controller: RunController,
    store: Arc<dyn RelationalStore>,
    search: Arc<dyn SearchPublisher>,
    target: SearchTarget,
}

impl EtlSession {
    pub fn new(
        controller: RunController,
        store: Arc<dyn RelationalStore>,
        search: Arc<dyn SearchPublisher>,
        target: SearchTarget,
    ) -> Self {
        Self {
            controller,
            store,
            search,
            target,
        }
    }

    /// Run the whole session: clear stale queued runs, sync every entity
    /// kind in dependency order, then republish search if products landed.
    pub async fn run(&self) -> Result<SessionSummary> {
        let cancelled = self
            .controller
            .cancel_stale_queued_runs()
            .await
            .context("Failed to clear stale queued runs")?;
        if cancelled > 0 {
            info!(count = cancelled, "Cancelled stale queued runs from a previous session");
        }

        let mut outcomes = Vec::with_capacity(EntityKind::IN_DEPENDENCY_ORDER.len());
        let mut synced: HashSet<EntityKind> = HashSet::new();

        for kind in EntityKind::IN_DEPENDENCY_ORDER {
            let unmet: Vec<EntityKind> = kind
                .descriptor()
                .dependencies
                .iter()
                .copied()
                .filter(|dep| !synced.contains(dep))
                .collect();

            let outcome = if let Some(dep) = unmet.first() {
                warn!(entity = %kind, dependency = %dep, "Skipping entity, dependency not synced");
                RunOutcome::Failed(format!("dependency {dep} not synced"))
            } else {
                self.controller
                    .run_and_sync(kind)
                    .await
                    .with_context(|| format!("Runner unreachable while syncing {kind}"))?
            };

            match &outcome {
                RunOutcome::Synced(result) => {
                    info!(
                        entity = %kind,
                        inserted = result.rows_inserted,
                        merged = result.rows_merged,
                        "Entity synced"
                    );
                    synced.insert(kind);
                },
                RunOutcome::Failed(reason) => {
                    warn!(entity = %kind, reason = %reason, "Entity sync failed");
                },
                RunOutcome::Cancelled => {
                    warn!(entity = %kind, "Entity sync cancelled");
                },
            }

            outcomes.push((kind, outcome));
        }

        let search_republished = self.republish_search().await?;

        Ok(SessionSummary {
            outcomes,
            search_republished,
        })
    }

    /// Rebuild the product search index from the production table.
    ///
    /// Skipped when the table is empty so an index backed by data is never
    /// replaced with an empty one.
    async fn republish_search(&self) -> Result<bool> {
        let count = self
            .store
            .scalar(&format!("SELECT COUNT(*) FROM {}", self.target.table))
            .await
            .context("Failed to count production products")?;

        if count == 0 {
            info!(table = %self.target.table, "No products in production, skipping search republish");
            return Ok(false);
        }

        info!(
            index = %self.target.index_name,
            products = count,
            "Republishing product search index"
        );

        let schema = product_index_schema(&self.target.index_name);
        let data_source = DataSourceRef {
            name: self.target.data_source_name.clone(),
            table: self.target.table.clone(),
        };

        self.search
            .ensure_index_deleted(&self.target.index_name)
            .await
            .context("Failed to delete old search index")?;
        self.search
            .ensure_index_and_indexer_created(&schema, &data_source)
            .await
            .context("Failed to recreate search index and indexer")?;

        Ok(true)
    }
}
