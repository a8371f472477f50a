//! Google Cloud Storage backend (Firebase Storage) returning V4 signed URLs.

use crate::bucket::{classify, put_options};
use crate::keys::{encode_key, validate_key};
use crate::traits::{Storage, StorageError, StorageResult};
use crate::StorageBackend;
use async_trait::async_trait;
use bytes::Bytes;
use campus_core::config::{ServiceAccount, SignedConfig};
use http::Method;
use object_store::gcp::{GoogleCloudStorage, GoogleCloudStorageBuilder};
use object_store::path::Path;
use object_store::signer::Signer;
use object_store::Error as ObjectStoreError;
use object_store::{ObjectStore, ObjectStoreExt, PutPayload};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::OnceCell;

const PLAIN_URL_BASE: &str = "https://storage.googleapis.com";

/// Produces a time-limited GET URL for an object key
#[async_trait]
pub trait UrlSigner: Send + Sync {
    async fn sign_get(&self, storage_key: &str, ttl: Duration) -> StorageResult<String>;
}

/// Signs with the service account the GCS client was built from
struct GcsSigner(Arc<GoogleCloudStorage>);

#[async_trait]
impl UrlSigner for GcsSigner {
    async fn sign_get(&self, storage_key: &str, ttl: Duration) -> StorageResult<String> {
        let location = Path::from(storage_key.to_string());
        let url = self
            .0
            .signed_url(Method::GET, &location, ttl)
            .await
            .map_err(|e| StorageError::BackendError(e.to_string()))?;
        Ok(url.to_string())
    }
}

#[derive(Clone)]
struct Handle {
    store: Arc<dyn object_store::ObjectStore>,
    signer: Arc<dyn UrlSigner>,
}

/// Signed-URL storage implementation
#[derive(Clone)]
pub struct SignedUrlStorage {
    config: Option<SignedConfig>,
    handle: Arc<OnceCell<Handle>>,
    bucket: String,
    url_ttl: Duration,
}

impl std::fmt::Debug for SignedUrlStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignedUrlStorage")
            .field("bucket", &self.bucket)
            .field("url_ttl", &self.url_ttl)
            .field("initialized", &self.handle.initialized())
            .finish()
    }
}

impl SignedUrlStorage {
    pub fn new(config: SignedConfig) -> Self {
        SignedUrlStorage {
            bucket: config.bucket.clone(),
            url_ttl: Duration::from_secs(config.url_ttl_secs),
            config: Some(config),
            handle: Arc::new(OnceCell::new()),
        }
    }

    /// Backend over an already built store and signer
    pub fn with_store(
        store: Arc<dyn object_store::ObjectStore>,
        signer: Arc<dyn UrlSigner>,
        bucket: impl Into<String>,
        url_ttl: Duration,
    ) -> Self {
        SignedUrlStorage {
            config: None,
            handle: Arc::new(OnceCell::new_with(Some(Handle { store, signer }))),
            bucket: bucket.into(),
            url_ttl,
        }
    }

    async fn handle(&self) -> StorageResult<&Handle> {
        self.handle
            .get_or_try_init(|| async {
                let config = self.config.as_ref().ok_or_else(|| {
                    StorageError::ConfigError("signed backend has no configuration".to_string())
                })?;
                let builder = GoogleCloudStorageBuilder::new().with_bucket_name(config.bucket.clone());
                let builder = match &config.service_account {
                    ServiceAccount::Key(key) => builder.with_service_account_key(key.clone()),
                    ServiceAccount::Path(path) => builder.with_service_account_path(path.clone()),
                };
                let gcs = Arc::new(
                    builder
                        .build()
                        .map_err(|e| StorageError::ConfigError(e.to_string()))?,
                );
                tracing::info!(bucket = %config.bucket, "Signed URL storage client initialized");
                Ok(Handle {
                    store: gcs.clone(),
                    signer: Arc::new(GcsSigner(gcs)),
                })
            })
            .await
    }
}

#[async_trait]
impl Storage for SignedUrlStorage {
    async fn upload(
        &self,
        storage_key: &str,
        content_type: &str,
        data: Bytes,
    ) -> StorageResult<String> {
        validate_key(storage_key)?;
        let handle = self.handle().await?;
        let size = data.len();
        let location = Path::from(storage_key.to_string());
        let start = std::time::Instant::now();

        handle
            .store
            .put_opts(&location, PutPayload::from(data), put_options(content_type))
            .await
            .map_err(|e| {
                tracing::error!(
                    error = %e,
                    bucket = %self.bucket,
                    key = %storage_key,
                    size_bytes = size,
                    "Signed storage upload failed"
                );
                classify(e, StorageError::UploadFailed)
            })?;

        let url = match handle.signer.sign_get(storage_key, self.url_ttl).await {
            Ok(url) => url,
            Err(e) => {
                // The plain URL answers 403 unless the object is public.
                tracing::warn!(
                    error = %e,
                    bucket = %self.bucket,
                    key = %storage_key,
                    "URL signing failed, returning plain object URL"
                );
                self.public_url(storage_key)
            }
        };

        tracing::info!(
            bucket = %self.bucket,
            key = %storage_key,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Signed storage upload successful"
        );

        Ok(url)
    }

    async fn download(&self, storage_key: &str) -> StorageResult<Vec<u8>> {
        validate_key(storage_key)?;
        let handle = self.handle().await?;
        let location = Path::from(storage_key.to_string());

        let result = handle.store.get(&location).await.map_err(|e| match e {
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
        let handle = self.handle().await?;
        let location = Path::from(storage_key.to_string());

        match handle.store.delete(&location).await {
            Ok(()) | Err(ObjectStoreError::NotFound { .. }) => {
                tracing::info!(bucket = %self.bucket, key = %storage_key, "Signed storage delete successful");
                Ok(())
            }
            Err(e) => Err(classify(e, StorageError::DeleteFailed)),
        }
    }

    async fn exists(&self, storage_key: &str) -> StorageResult<bool> {
        validate_key(storage_key)?;
        let handle = self.handle().await?;
        let location = Path::from(storage_key.to_string());
        match handle.store.head(&location).await {
            Ok(_) => Ok(true),
            Err(ObjectStoreError::NotFound { .. }) => Ok(false),
            Err(e) => Err(classify(e, StorageError::BackendError)),
        }
    }

    /// Unsigned object URL; signed URLs are only minted at upload time.
    fn public_url(&self, storage_key: &str) -> String {
        format!("{}/{}/{}", PLAIN_URL_BASE, self.bucket, encode_key(storage_key))
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::RemoteSigned
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use object_store::memory::InMemory;

    struct FixedSigner;

    #[async_trait]
    impl UrlSigner for FixedSigner {
        async fn sign_get(&self, storage_key: &str, ttl: Duration) -> StorageResult<String> {
            Ok(format!(
                "https://signed.example/{}?X-Goog-Expires={}",
                storage_key,
                ttl.as_secs()
            ))
        }
    }

    struct BrokenSigner;

    #[async_trait]
    impl UrlSigner for BrokenSigner {
        async fn sign_get(&self, _storage_key: &str, _ttl: Duration) -> StorageResult<String> {
            Err(StorageError::BackendError("no private key".to_string()))
        }
    }

    fn storage(signer: Arc<dyn UrlSigner>) -> SignedUrlStorage {
        SignedUrlStorage::with_store(
            Arc::new(InMemory::new()),
            signer,
            "app.appspot.com",
            Duration::from_secs(3600),
        )
    }

    #[tokio::test]
    async fn upload_returns_signed_url() {
        let storage = storage(Arc::new(FixedSigner));
        let url = storage
            .upload("books/a.pdf", "application/pdf", Bytes::from_static(b"%PDF"))
            .await
            .unwrap();
        assert_eq!(url, "https://signed.example/books/a.pdf?X-Goog-Expires=3600");
        assert!(storage.exists("books/a.pdf").await.unwrap());
    }

    #[tokio::test]
    async fn upload_records_content_type() {
        let store = Arc::new(InMemory::new());
        let storage = SignedUrlStorage::with_store(
            store.clone(),
            Arc::new(FixedSigner),
            "app.appspot.com",
            Duration::from_secs(3600),
        );
        storage
            .upload("courses/v.mp4", "video/mp4", Bytes::from_static(b"mp4"))
            .await
            .unwrap();

        let object = store.get(&Path::from("courses/v.mp4")).await.unwrap();
        assert_eq!(
            object
                .attributes
                .get(&object_store::Attribute::ContentType)
                .map(|value| value.as_ref()),
            Some("video/mp4")
        );
    }

    #[tokio::test]
    async fn signing_failure_degrades_to_plain_url() {
        let storage = storage(Arc::new(BrokenSigner));
        let url = storage
            .upload("books/a.pdf", "application/pdf", Bytes::from_static(b"%PDF"))
            .await
            .unwrap();
        assert_eq!(url, "https://storage.googleapis.com/app.appspot.com/books/a.pdf");
        assert_eq!(storage.download("books/a.pdf").await.unwrap(), b"%PDF");
    }

    #[tokio::test]
    async fn delete_missing_object_is_ok() {
        let storage = storage(Arc::new(FixedSigner));
        storage.delete("books/none.pdf").await.unwrap();
    }

    #[test]
    fn construction_from_config_is_lazy() {
        let storage = SignedUrlStorage::new(SignedConfig {
            bucket: "app.appspot.com".to_string(),
            service_account: ServiceAccount::Path("/nonexistent/sa.json".to_string()),
            url_ttl_secs: 60,
        });
        assert!(!storage.handle.initialized());
        assert_eq!(storage.url_ttl, Duration::from_secs(60));
    }

    #[tokio::test]
    async fn unreadable_service_account_is_a_config_error() {
        let storage = SignedUrlStorage::new(SignedConfig {
            bucket: "app.appspot.com".to_string(),
            service_account: ServiceAccount::Path("/nonexistent/sa.json".to_string()),
            url_ttl_secs: 60,
        });
        let err = storage
            .upload("books/a.pdf", "application/pdf", Bytes::from_static(b"x"))
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::ConfigError(_)));
        assert!(!storage.handle.initialized());
    }
}
