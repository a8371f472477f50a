use crate::keys::validate_key;
use crate::traits::{Storage, StorageError, StorageResult};
use crate::StorageBackend;
use async_trait::async_trait;
use bytes::Bytes;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;

/// Local filesystem storage implementation
///
/// Needs no credentials, so it is always the last link of the fallback chain.
/// Only filesystem errors can make it fail, and those are returned as
/// [`StorageError::IoError`].
#[derive(Clone, Debug)]
pub struct LocalStorage {
    base_path: PathBuf,
    base_url: String,
}

impl LocalStorage {
    /// Create a new LocalStorage instance
    ///
    /// # Arguments
    /// * `base_path` - Root directory for file storage (e.g., "/var/lib/campus/uploads")
    /// * `base_url` - Base URL for serving files (e.g., "http://localhost:4000/files")
    pub async fn new(base_path: impl Into<PathBuf>, base_url: String) -> StorageResult<Self> {
        let base_path = base_path.into();

        fs::create_dir_all(&base_path).await.map_err(|e| {
            StorageError::IoError(std::io::Error::new(
                e.kind(),
                format!(
                    "Failed to create storage directory {}: {}",
                    base_path.display(),
                    e
                ),
            ))
        })?;

        Ok(LocalStorage {
            base_path,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Convert storage key to filesystem path with security validation
    fn key_to_path(&self, storage_key: &str) -> StorageResult<PathBuf> {
        validate_key(storage_key)?;
        Ok(self.base_path.join(storage_key))
    }

    /// Ensure parent directory exists. `create_dir_all` tolerates concurrent creation.
    async fn ensure_parent_dir(&self, path: &Path) -> StorageResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        Ok(())
    }
}

fn io_context(path: &Path, action: &str, e: std::io::Error) -> StorageError {
    StorageError::IoError(std::io::Error::new(
        e.kind(),
        format!("Failed to {} {}: {}", action, path.display(), e),
    ))
}

#[async_trait]
impl Storage for LocalStorage {
    async fn upload(
        &self,
        storage_key: &str,
        _content_type: &str,
        data: Bytes,
    ) -> StorageResult<String> {
        let path = self.key_to_path(storage_key)?;
        let size = data.len();

        self.ensure_parent_dir(&path).await?;

        let start = std::time::Instant::now();

        let mut file = fs::File::create(&path)
            .await
            .map_err(|e| io_context(&path, "create file", e))?;

        file.write_all(&data)
            .await
            .map_err(|e| io_context(&path, "write file", e))?;

        file.sync_all()
            .await
            .map_err(|e| io_context(&path, "sync file", e))?;

        let url = self.public_url(storage_key);

        tracing::info!(
            path = %path.display(),
            key = %storage_key,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local storage upload successful"
        );

        Ok(url)
    }

    async fn download(&self, storage_key: &str) -> StorageResult<Vec<u8>> {
        let path = self.key_to_path(storage_key)?;

        match fs::read(&path).await {
            Ok(data) => {
                tracing::debug!(
                    key = %storage_key,
                    size_bytes = data.len(),
                    "Local storage download successful"
                );
                Ok(data)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(StorageError::NotFound(storage_key.to_string()))
            }
            Err(e) => Err(io_context(&path, "read file", e)),
        }
    }

    async fn delete(&self, storage_key: &str) -> StorageResult<()> {
        let path = self.key_to_path(storage_key)?;
        let start = std::time::Instant::now();

        match fs::remove_file(&path).await {
            Ok(()) => {
                tracing::info!(
                    path = %path.display(),
                    key = %storage_key,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "Local storage delete successful"
                );
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!(key = %storage_key, "Local file already absent");
                Ok(())
            }
            Err(e) => Err(io_context(&path, "delete file", e)),
        }
    }

    async fn exists(&self, storage_key: &str) -> StorageResult<bool> {
        let path = self.key_to_path(storage_key)?;
        Ok(fs::try_exists(&path).await.unwrap_or(false))
    }

    fn public_url(&self, storage_key: &str) -> String {
        format!("{}/{}", self.base_url, storage_key)
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Disk
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    async fn storage_in(dir: &Path) -> LocalStorage {
        LocalStorage::new(dir, "http://localhost:4000/files/".to_string())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_local_storage_upload_download() {
        let dir = tempdir().unwrap();
        let storage = storage_in(dir.path()).await;

        let data = Bytes::from_static(b"test data");
        let url = storage
            .upload("courses/test.txt", "text/plain", data.clone())
            .await
            .unwrap();

        assert_eq!(url, "http://localhost:4000/files/courses/test.txt");
        assert!(dir.path().join("courses").join("test.txt").exists());

        let downloaded = storage.download("courses/test.txt").await.unwrap();
        assert_eq!(data.as_ref(), downloaded.as_slice());
    }

    #[tokio::test]
    async fn test_path_traversal_rejected() {
        let dir = tempdir().unwrap();
        let storage = storage_in(dir.path()).await;

        let result = storage.download("../../../etc/passwd").await;
        assert!(matches!(result, Err(StorageError::InvalidKey(_))));

        let result = storage.delete("../etc/passwd").await;
        assert!(matches!(result, Err(StorageError::InvalidKey(_))));

        let result = storage.exists("/etc/passwd").await;
        assert!(matches!(result, Err(StorageError::InvalidKey(_))));
    }

    #[tokio::test]
    async fn test_local_storage_delete_is_idempotent() {
        let dir = tempdir().unwrap();
        let storage = storage_in(dir.path()).await;

        storage
            .upload("books/a.pdf", "application/pdf", Bytes::from_static(b"%PDF"))
            .await
            .unwrap();

        storage.delete("books/a.pdf").await.unwrap();
        storage.delete("books/a.pdf").await.unwrap();
        assert!(!storage.exists("books/a.pdf").await.unwrap());
    }

    #[tokio::test]
    async fn test_local_storage_download_missing_is_not_found() {
        let dir = tempdir().unwrap();
        let storage = storage_in(dir.path()).await;

        let result = storage.download("courses/missing.jpg").await;
        assert!(matches!(result, Err(StorageError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_concurrent_uploads_into_new_category() {
        let dir = tempdir().unwrap();
        let storage = storage_in(dir.path()).await;

        let uploads = (0..8).map(|i| {
            let storage = storage.clone();
            tokio::spawn(async move {
                storage
                    .upload(
                        &format!("fresh/{}.txt", i),
                        "text/plain",
                        Bytes::from(vec![i as u8; 16]),
                    )
                    .await
            })
        });

        for handle in uploads.collect::<Vec<_>>() {
            handle.await.unwrap().unwrap();
        }
        assert_eq!(std::fs::read_dir(dir.path().join("fresh")).unwrap().count(), 8);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_write_failure_is_an_io_error() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir().unwrap();
        let storage = storage_in(dir.path()).await;
        let locked = dir.path().join("locked");
        std::fs::create_dir(&locked).unwrap();
        std::fs::set_permissions(&locked, std::fs::Permissions::from_mode(0o500)).unwrap();

        // Root ignores directory permissions; nothing to assert there.
        if std::fs::write(locked.join("write-check"), b"x").is_ok() {
            return;
        }

        let result = storage
            .upload("locked/a.txt", "text/plain", Bytes::from_static(b"x"))
            .await;
        assert!(matches!(result, Err(StorageError::IoError(_))));
    }
}
