//! Storage setup

use anyhow::{Context, Result};
use campus_core::Config;
use campus_storage::{create_router, StorageRouter};
use std::sync::Arc;

pub async fn setup_storage(config: &Config) -> Result<Arc<StorageRouter>> {
    let router = create_router(&config.storage)
        .await
        .context("Failed to initialize storage")?;

    tracing::info!(
        mode = %router.mode(),
        selected = %router.selected_backend(),
        configured = ?router.configured_backends(),
        "Storage ready"
    );

    Ok(Arc::new(router))
}
