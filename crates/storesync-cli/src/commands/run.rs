//! `storesync run` - execute one full orchestration session

use std::sync::Arc;

use anyhow::{anyhow, Context};
use storesync_engine::db::{self, PgStore};
use storesync_engine::runner::http::HttpPipelineRunner;
use storesync_engine::search::HttpSearchPublisher;
use storesync_engine::{Config, EtlSession, RunController, SearchTarget};
use tracing::info;

use crate::error::Result;

pub async fn run(config: &Config) -> Result<()> {
    let pool = db::create_pool(&config.database).await?;
    db::health_check(&pool).await?;

    let store = Arc::new(PgStore::new(pool));
    let runner = Arc::new(HttpPipelineRunner::new(config.runner.clone())?);
    let search = Arc::new(
        HttpSearchPublisher::new(config.search.clone())
            .context("Failed to build search client")?,
    );

    let controller = RunController::new(runner, store.clone(), config.controller.clone());
    let target = SearchTarget {
        index_name: config.search.index_name.clone(),
        data_source_name: config.search.data_source_name.clone(),
        ..SearchTarget::default()
    };
    let session = EtlSession::new(controller, store, search, target);

    info!("Starting orchestration session");
    let summary = session.run().await?;

    println!("Session complete:");
    println!("{}", summary.render());

    if !summary.all_synced() {
        return Err(anyhow!("one or more entity kinds failed to sync").into());
    }

    Ok(())
}
