#[cfg(feature = "storage-remote")]
use crate::{BucketStorage, SignedUrlStorage};
use crate::{select_backend, LocalStorage, Storage, StorageResult, StorageRouter};
#[cfg(not(feature = "storage-remote"))]
use crate::{StorageBackend, StorageError, StorageMode};
use campus_core::StorageConfig;
use std::sync::Arc;

/// Create the storage router from configuration.
///
/// Every backend whose configuration is present is constructed; remote
/// clients are built lazily on first use, so this touches only the local
/// filesystem (creating the disk root).
pub async fn create_router(config: &StorageConfig) -> StorageResult<StorageRouter> {
    let mut backends: Vec<Arc<dyn Storage>> = Vec::new();

    #[cfg(feature = "storage-remote")]
    {
        if let Some(bucket) = config.bucket.clone() {
            backends.push(Arc::new(BucketStorage::new(bucket)));
        }
        if let Some(signed) = config.signed.clone() {
            backends.push(Arc::new(SignedUrlStorage::new(signed)));
        }
    }

    #[cfg(not(feature = "storage-remote"))]
    if let StorageMode::Pinned(backend @ (StorageBackend::RemoteBucket | StorageBackend::RemoteSigned)) =
        config.mode
    {
        return Err(StorageError::ConfigError(format!(
            "{} backend not available (storage-remote feature not enabled)",
            backend
        )));
    }

    let disk = LocalStorage::new(config.disk.root.clone(), config.disk.base_url.clone()).await?;
    backends.push(Arc::new(disk));

    let router = StorageRouter::new(config.mode, backends)?;

    tracing::info!(
        mode = %config.mode,
        selected = %select_backend(config),
        configured = ?router.configured_backends(),
        "Storage router ready"
    );

    Ok(router)
}
