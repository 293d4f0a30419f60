//! StoreSync orchestration engine
//!
//! Moves four related commerce record sets (categories, products, orders,
//! order-products) through a blob store into relational staging tables via an
//! external pipeline runner, merges staging into production with upsert
//! semantics, and republishes the product search index.
//!
//! The interesting pieces live in:
//!
//! - [`sync`] - the staging-to-production merge engine
//! - [`controller`] - the pipeline-run lifecycle controller
//! - [`pipeline`] - the per-entity-kind job spec builder
//! - [`session`] - one full orchestration pass over all entity kinds
//!
//! External collaborators sit behind traits: [`runner::PipelineRunner`],
//! [`db::RelationalStore`], [`search::SearchPublisher`], and the S3-backed
//! [`storage::BlobStore`].

pub mod config;
pub mod controller;
pub mod db;
pub mod entity;
pub mod pipeline;
pub mod runner;
pub mod search;
pub mod session;
pub mod storage;
pub mod sync;

pub use config::Config;
pub use controller::{ControllerConfig, RunController, RunOutcome};
pub use entity::EntityKind;
pub use session::{EtlSession, SearchTarget, SessionSummary};
pub use sync::{MergeSync, SyncResult};
