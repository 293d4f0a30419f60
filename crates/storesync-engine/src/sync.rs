//! Staging-to-production merge engine
//!
//! Reconciles one staging table into its production table per entity kind
//! with three statements, executed as a single transaction:
//!
//! 1. identity insert - staging rows with NULL keys become new production
//!    rows; production assigns the surrogate key
//! 2. keyed upsert - staging rows with keys overwrite matching production
//!    rows, or insert with that exact key when no match exists
//! 3. drain - the staging table is emptied unconditionally
//!
//! The order matters: identity rows must be claimed before the drain, and
//! the drain must only run after both row classes are durably written. A
//! failure of any statement rolls the whole batch back and leaves staging
//! intact for inspection; nothing is retried automatically. Running a sync
//! against an already-empty staging table is a no-op.

use std::sync::Arc;

use tracing::{error, info};

use crate::db::{RelationalStore, StoreError, StoreResult};
use crate::entity::{EntityDescriptor, EntityKind};

/// Row counts reported by one successful sync.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SyncResult {
    /// Staging rows with NULL keys appended to production.
    pub rows_inserted: u64,
    /// Keyed staging rows reconciled into production (updated or inserted).
    pub rows_merged: u64,
}

/// The merge engine. Cheap to clone; holds only the store handle.
#[derive(Clone)]
pub struct MergeSync {
    store: Arc<dyn RelationalStore>,
}

impl MergeSync {
    pub fn new(store: Arc<dyn RelationalStore>) -> Self {
        Self { store }
    }

    /// Reconcile the staging table for `kind` into its production table.
    ///
    /// Idempotent: repeating the call with no new staging rows leaves
    /// production unchanged and staging empty.
    pub async fn sync(&self, kind: EntityKind) -> StoreResult<SyncResult> {
        let descriptor = kind.descriptor();

        info!(
            entity = %kind,
            staging = descriptor.staging_table,
            production = descriptor.production_table,
            "Merging staging rows into production"
        );

        let statements = [
            identity_insert_sql(descriptor),
            keyed_upsert_sql(descriptor),
            drain_sql(descriptor),
        ];

        let affected = self
            .store
            .exec_transaction(&statements)
            .await
            .map_err(|e| {
                error!(
                    entity = %kind,
                    staging = descriptor.staging_table,
                    error = %e,
                    "Merge transaction failed; staging left intact"
                );
                e
            })?;

        let [inserted, merged, drained] = affected[..] else {
            return Err(StoreError::Mismatch(format!(
                "{} results for {} statements",
                affected.len(),
                statements.len()
            )));
        };

        let result = SyncResult {
            rows_inserted: inserted,
            rows_merged: merged,
        };

        info!(
            entity = %kind,
            inserted = result.rows_inserted,
            merged = result.rows_merged,
            drained = drained,
            "Sync and reset of staging table complete"
        );

        Ok(result)
    }
}

/// Copy staging rows whose key columns are NULL into production, letting
/// production assign new identities. The payload column list is used because
/// the composite-key kind carries its keys in the payload.
fn identity_insert_sql(d: &EntityDescriptor) -> String {
    let columns = join_names(d.source_columns.iter().map(|c| c.name));
    let null_keys = d
        .key_columns
        .iter()
        .map(|k| format!("{k} IS NULL"))
        .collect::<Vec<_>>()
        .join(" OR ");

    format!(
        "INSERT INTO {production} ({columns}) \
         SELECT {columns} FROM {staging} WHERE {null_keys}",
        production = d.production_table,
        staging = d.staging_table,
    )
}

/// Upsert keyed staging rows against production: update all non-key columns
/// on a key match, insert with the exact staged key otherwise.
fn keyed_upsert_sql(d: &EntityDescriptor) -> String {
    let insert_columns = join_names(
        d.key_columns
            .iter()
            .copied()
            .chain(d.data_columns.iter().map(|c| c.name)),
    );
    let keys_present = d
        .key_columns
        .iter()
        .map(|k| format!("{k} IS NOT NULL"))
        .collect::<Vec<_>>()
        .join(" AND ");
    let conflict_target = join_names(d.key_columns.iter().copied());
    let updates = d
        .data_columns
        .iter()
        .map(|c| format!("{name} = excluded.{name}", name = c.name))
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        "INSERT INTO {production} ({insert_columns}) \
         SELECT {insert_columns} FROM {staging} WHERE {keys_present} \
         ON CONFLICT ({conflict_target}) DO UPDATE SET {updates}",
        production = d.production_table,
        staging = d.staging_table,
    )
}

/// Remove every staging row, regardless of how many were reconciled.
fn drain_sql(d: &EntityDescriptor) -> String {
    format!("DELETE FROM {}", d.staging_table)
}

fn join_names<'a>(names: impl Iterator<Item = &'a str>) -> String {
    names.collect::<Vec<_>>().join(", ")
}
