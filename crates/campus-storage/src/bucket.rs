//! S3-protocol bucket backend (Supabase Storage).
//!
//! The `AmazonS3` handle is built on first use, so constructing the backend
//! never touches the network and a failed build is retried on the next call.

use crate::keys::{encode_key, validate_key};
use crate::traits::{Storage, StorageError, StorageResult};
use crate::StorageBackend;
use async_trait::async_trait;
use bytes::Bytes;
use campus_core::config::BucketConfig;
use object_store::aws::AmazonS3Builder;
use object_store::path::Path;
use object_store::Error as ObjectStoreError;
use object_store::{
    Attribute, Attributes, ObjectStore, ObjectStoreExt, PutOptions, PutPayload,
};
use std::sync::Arc;
use tokio::sync::OnceCell;

type Store = Arc<dyn object_store::ObjectStore>;

/// Bucket storage implementation
#[derive(Clone)]
pub struct BucketStorage {
    config: Option<BucketConfig>,
    store: Arc<OnceCell<Store>>,
    bucket: String,
    public_url: String,
}

impl std::fmt::Debug for BucketStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BucketStorage")
            .field("bucket", &self.bucket)
            .field("public_url", &self.public_url)
            .field("initialized", &self.store.initialized())
            .finish()
    }
}

impl BucketStorage {
    /// Backend that builds its S3 client from `config` on first use
    pub fn new(config: BucketConfig) -> Self {
        BucketStorage {
            bucket: config.bucket.clone(),
            public_url: config.public_url.trim_end_matches('/').to_string(),
            config: Some(config),
            store: Arc::new(OnceCell::new()),
        }
    }

    /// Backend over an already built store (tests use `InMemory`)
    pub fn with_store(store: Store, bucket: impl Into<String>, public_url: impl Into<String>) -> Self {
        BucketStorage {
            config: None,
            store: Arc::new(OnceCell::new_with(Some(store))),
            bucket: bucket.into(),
            public_url: public_url.into().trim_end_matches('/').to_string(),
        }
    }

    async fn store(&self) -> StorageResult<&Store> {
        self.store
            .get_or_try_init(|| async {
                let config = self.config.as_ref().ok_or_else(|| {
                    StorageError::ConfigError("bucket backend has no configuration".to_string())
                })?;
                let store = build_store(config)?;
                tracing::info!(
                    bucket = %config.bucket,
                    endpoint = %config.endpoint,
                    "Bucket storage client initialized"
                );
                Ok(store)
            })
            .await
    }
}

fn build_store(config: &BucketConfig) -> StorageResult<Store> {
    let store = AmazonS3Builder::new()
        .with_endpoint(config.endpoint.clone())
        .with_allow_http(config.endpoint.starts_with("http://"))
        .with_region(config.region.clone())
        .with_bucket_name(config.bucket.clone())
        .with_access_key_id(config.access_key_id.clone())
        .with_secret_access_key(config.secret_access_key.clone())
        .build()
        .map_err(|e| StorageError::ConfigError(e.to_string()))?;
    Ok(Arc::new(store))
}

/// Credential problems mean the backend is misconfigured, not flaky.
/// Stored with the object so the public URL serves the right `Content-Type`.
pub(crate) fn put_options(content_type: &str) -> PutOptions {
    PutOptions {
        attributes: Attributes::from_iter([(
            Attribute::ContentType,
            object_store::AttributeValue::from(content_type.to_string()),
        )]),
        ..Default::default()
    }
}

pub(crate) fn classify(err: ObjectStoreError, otherwise: fn(String) -> StorageError) -> StorageError {
    match err {
        ObjectStoreError::PermissionDenied { .. } | ObjectStoreError::Unauthenticated { .. } => {
            StorageError::ConfigError(err.to_string())
        }
        other => otherwise(other.to_string()),
    }
}

#[async_trait]
impl Storage for BucketStorage {
    async fn upload(
        &self,
        storage_key: &str,
        content_type: &str,
        data: Bytes,
    ) -> StorageResult<String> {
        validate_key(storage_key)?;
        let store = self.store().await?;
        let size = data.len();
        let location = Path::from(storage_key.to_string());
        let start = std::time::Instant::now();

        store
            .put_opts(&location, PutPayload::from(data), put_options(content_type))
            .await
            .map_err(|e| {
                tracing::error!(
                    error = %e,
                    bucket = %self.bucket,
                    key = %storage_key,
                    size_bytes = size,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "Bucket upload failed"
                );
                classify(e, StorageError::UploadFailed)
            })?;

        tracing::info!(
            bucket = %self.bucket,
            key = %storage_key,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Bucket upload successful"
        );

        Ok(self.public_url(storage_key))
    }

    async fn download(&self, storage_key: &str) -> StorageResult<Vec<u8>> {
        validate_key(storage_key)?;
        let store = self.store().await?;
        let location = Path::from(storage_key.to_string());

        let result = store.get(&location).await.map_err(|e| match e {
            ObjectStoreError::NotFound { .. } => StorageError::NotFound(storage_key.to_string()),
            other => classify(other, StorageError::DownloadFailed),
        })?;

        let bytes = result
            .bytes()
            .await
            .map_err(|e| StorageError::DownloadFailed(e.to_string()))?;

        Ok(bytes.to_vec())
    }

    async fn delete(&self, storage_key: &str) -> StorageResult<()> {
        validate_key(storage_key)?;
        let store = self.store().await?;
        let location = Path::from(storage_key.to_string());
        let start = std::time::Instant::now();

        match store.delete(&location).await {
            Ok(()) | Err(ObjectStoreError::NotFound { .. }) => {
                tracing::info!(
                    bucket = %self.bucket,
                    key = %storage_key,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "Bucket delete successful"
                );
                Ok(())
            }
            Err(e) => Err(classify(e, StorageError::DeleteFailed)),
        }
    }

    async fn exists(&self, storage_key: &str) -> StorageResult<bool> {
        validate_key(storage_key)?;
        let store = self.store().await?;
        let location = Path::from(storage_key.to_string());
        match store.head(&location).await {
            Ok(_) => Ok(true),
            Err(ObjectStoreError::NotFound { .. }) => Ok(false),
            Err(e) => Err(classify(e, StorageError::BackendError)),
        }
    }

    fn public_url(&self, storage_key: &str) -> String {
        format!("{}/{}/{}", self.public_url, self.bucket, encode_key(storage_key))
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::RemoteBucket
    }
}
