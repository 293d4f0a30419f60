//! `storesync search` - query the republished product search index

use storesync_engine::search::HttpSearchPublisher;
use storesync_engine::Config;
use tracing::info;

use crate::error::Result;

pub async fn run(config: &Config, query: &str) -> Result<()> {
    let publisher = HttpSearchPublisher::new(config.search.clone())?;

    info!(index = %config.search.index_name, query = %query, "Running product search");
    let hits = publisher.query(query).await?;

    if hits.is_empty() {
        println!("No products matched '{query}'");
        return Ok(());
    }

    for hit in &hits {
        println!(
            "  {:<8} {:<32} {:>8}  {}",
            hit.product_id, hit.product_name, hit.price, hit.description
        );
    }
    println!("{} product(s) matched '{query}'", hits.len());

    Ok(())
}
