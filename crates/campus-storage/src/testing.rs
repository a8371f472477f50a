//! Scripted storage wrappers for exercising fallback and rollback paths.

use crate::traits::{Storage, StorageError, StorageResult};
use crate::StorageBackend;
use async_trait::async_trait;
use bytes::Bytes;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Failure a [`FlakyStorage`] injects into uploads
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Failure {
    /// Transient backend failure, eligible for fallback
    Upload,
    /// Missing credentials, eligible for fallback
    Config,
    /// Filesystem failure, never falls back
    Io,
}

impl Failure {
    fn to_error(self, key: &str) -> StorageError {
        match self {
            Failure::Upload => StorageError::UploadFailed(format!("injected failure for {}", key)),
            Failure::Config => StorageError::ConfigError("injected: no credentials".to_string()),
            Failure::Io => StorageError::IoError(std::io::Error::other("injected: disk full")),
        }
    }
}

/// Wraps a real backend, counts calls and fails on demand
pub struct FlakyStorage {
    inner: Arc<dyn Storage>,
    backend: StorageBackend,
    upload_failure: Mutex<Option<Failure>>,
    fail_after: Mutex<Option<usize>>,
    fail_deletes: Mutex<bool>,
    uploads: AtomicUsize,
    deletes: AtomicUsize,
}

impl FlakyStorage {
    pub fn new(inner: Arc<dyn Storage>) -> Self {
        FlakyStorage {
            backend: inner.backend_type(),
            inner,
            upload_failure: Mutex::new(None),
            fail_after: Mutex::new(None),
            fail_deletes: Mutex::new(false),
            uploads: AtomicUsize::new(0),
            deletes: AtomicUsize::new(0),
        }
    }

    /// Report a different backend type, e.g. a disk directory posing as a bucket
    pub fn posing_as(mut self, backend: StorageBackend) -> Self {
        self.backend = backend;
        self
    }

    /// Fail every upload from now on
    pub fn fail_uploads(&self, failure: Failure) {
        *self.upload_failure.lock().unwrap() = Some(failure);
        *self.fail_after.lock().unwrap() = None;
    }

    /// Let `successes` more uploads through, then fail the rest
    pub fn fail_uploads_after(&self, successes: usize, failure: Failure) {
        *self.upload_failure.lock().unwrap() = Some(failure);
        *self.fail_after.lock().unwrap() = Some(self.upload_calls() + successes);
    }

    pub fn fail_deletes(&self, fail: bool) {
        *self.fail_deletes.lock().unwrap() = fail;
    }

    pub fn heal(&self) {
        *self.upload_failure.lock().unwrap() = None;
        *self.fail_after.lock().unwrap() = None;
        self.fail_deletes(false);
    }

    /// Upload attempts, including failed ones
    pub fn upload_calls(&self) -> usize {
        self.uploads.load(Ordering::SeqCst)
    }

    /// Delete attempts, including failed ones
    pub fn delete_calls(&self) -> usize {
        self.deletes.load(Ordering::SeqCst)
    }

    pub fn total_calls(&self) -> usize {
        self.upload_calls() + self.delete_calls()
    }
}

#[async_trait]
impl Storage for FlakyStorage {
    async fn upload(
        &self,
        storage_key: &str,
        content_type: &str,
        data: Bytes,
    ) -> StorageResult<String> {
        let attempt = self.uploads.fetch_add(1, Ordering::SeqCst);
        let failure = *self.upload_failure.lock().unwrap();
        let threshold = *self.fail_after.lock().unwrap();
        if let Some(failure) = failure {
            if threshold.is_none_or(|n| attempt >= n) {
                return Err(failure.to_error(storage_key));
            }
        }
        self.inner.upload(storage_key, content_type, data).await
    }

    async fn download(&self, storage_key: &str) -> StorageResult<Vec<u8>> {
        self.inner.download(storage_key).await
    }

    async fn delete(&self, storage_key: &str) -> StorageResult<()> {
        self.deletes.fetch_add(1, Ordering::SeqCst);
        if *self.fail_deletes.lock().unwrap() {
            return Err(StorageError::DeleteFailed(format!(
                "injected failure for {}",
                storage_key
            )));
        }
        self.inner.delete(storage_key).await
    }

    async fn exists(&self, storage_key: &str) -> StorageResult<bool> {
        self.inner.exists(storage_key).await
    }

    fn public_url(&self, storage_key: &str) -> String {
        self.inner.public_url(storage_key)
    }

    fn backend_type(&self) -> StorageBackend {
        self.backend
    }
}
