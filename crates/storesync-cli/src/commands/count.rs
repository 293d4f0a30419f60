//! `storesync count` - report row counts per production and staging table

use std::sync::Arc;

use storesync_engine::db::{self, PgStore, RelationalStore};
use storesync_engine::entity::EntityKind;
use storesync_engine::Config;

use crate::error::Result;

pub async fn run(config: &Config) -> Result<()> {
    let pool = db::create_pool(&config.database).await?;
    db::health_check(&pool).await?;
    let store: Arc<dyn RelationalStore> = Arc::new(PgStore::new(pool));

    println!("{:<24} {:>12} {:>12}", "entity", "production", "staging");
    for kind in EntityKind::IN_DEPENDENCY_ORDER {
        let descriptor = kind.descriptor();
        let production = store
            .scalar(&format!("SELECT COUNT(*) FROM {}", descriptor.production_table))
            .await?;
        let staging = store
            .scalar(&format!("SELECT COUNT(*) FROM {}", descriptor.staging_table))
            .await?;

        println!("{:<24} {:>12} {:>12}", kind.as_str(), production, staging);
    }

    Ok(())
}
