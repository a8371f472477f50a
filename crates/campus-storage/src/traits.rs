//! Storage abstraction trait
//!
//! This module defines the Storage trait that all storage backends must implement.

use crate::StorageBackend;
use async_trait::async_trait;
use bytes::Bytes;
use campus_core::AppError;
use thiserror::Error;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    /// Missing or invalid credentials, or a backend that cannot be built
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// The backend rejected or did not complete a write
    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Download failed: {0}")]
    DownloadFailed(String),

    #[error("Delete failed: {0}")]
    DeleteFailed(String),

    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    /// Network or service failure not tied to one operation
    #[error("Storage backend error: {0}")]
    BackendError(String),

    /// Local filesystem failure; never retried elsewhere
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl StorageError {
    /// Whether the router may try the next backend after this error.
    pub fn is_fallback_eligible(&self) -> bool {
        matches!(
            self,
            StorageError::ConfigError(_)
                | StorageError::UploadFailed(_)
                | StorageError::BackendError(_)
        )
    }
}

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::InvalidKey(msg) => AppError::InvalidInput(msg),
            StorageError::NotFound(key) => AppError::NotFound(format!("File not found: {}", key)),
            other => AppError::Storage(other.to_string()),
        }
    }
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Storage abstraction trait
///
/// All backends (disk, bucket, signed-URL) implement this trait so the
/// router can hold them in one ordered chain.
///
/// **Key format:** `{category}/{filename}`. See the crate root documentation.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Write `data` under `storage_key` and return the URL to store on the record
    async fn upload(&self, storage_key: &str, content_type: &str, data: Bytes)
        -> StorageResult<String>;

    /// Download a file by its storage key
    async fn download(&self, storage_key: &str) -> StorageResult<Vec<u8>>;

    /// Delete a file by its storage key. A missing object is not an error.
    async fn delete(&self, storage_key: &str) -> StorageResult<()>;

    /// Check if a file exists
    async fn exists(&self, storage_key: &str) -> StorageResult<bool>;

    /// Address of `storage_key` under the current configuration, without I/O
    fn public_url(&self, storage_key: &str) -> String;

    /// Get the storage backend type
    fn backend_type(&self) -> StorageBackend;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_and_key_errors_stop_fallback() {
        assert!(StorageError::ConfigError("no creds".into()).is_fallback_eligible());
        assert!(StorageError::UploadFailed("timeout".into()).is_fallback_eligible());
        assert!(StorageError::BackendError("503".into()).is_fallback_eligible());
        assert!(!StorageError::IoError(std::io::Error::other("disk full")).is_fallback_eligible());
        assert!(!StorageError::InvalidKey("..".into()).is_fallback_eligible());
    }

    #[test]
    fn conversion_to_app_error() {
        let err: AppError = StorageError::UploadFailed("timeout".into()).into();
        assert_eq!(err.info().code, "STORAGE_ERROR");
        let err: AppError = StorageError::InvalidKey("bad".into()).into();
        assert_eq!(err.info().code, "INVALID_INPUT");
    }
}
