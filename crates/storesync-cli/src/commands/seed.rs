//! `storesync seed` - upload sample source payloads to the blob store

use anyhow::Context;
use storesync_engine::entity::EntityKind;
use storesync_engine::storage::BlobStore;
use storesync_engine::Config;
use tracing::info;

use crate::error::Result;
use crate::records;

pub async fn run(config: &Config) -> Result<()> {
    let store = BlobStore::new(config.blob.clone())
        .await
        .context("Failed to initialize blob store")?;

    for kind in EntityKind::IN_DEPENDENCY_ORDER {
        let descriptor = kind.descriptor();
        let payload = records::payload_for(kind)?;

        let upload = store
            .put_json(descriptor.blob_file, payload)
            .await
            .with_context(|| format!("Failed to upload {}", descriptor.blob_file))?;

        info!(
            entity = %kind,
            key = %upload.key,
            checksum = %upload.checksum,
            "Payload uploaded"
        );
        println!("  ✓ {} ({} bytes, sha256 {})", upload.key, upload.size, upload.checksum);
    }

    println!("Seeded {} payloads", EntityKind::IN_DEPENDENCY_ORDER.len());
    Ok(())
}
