//! Backend selection and fallback.
//!
//! The router owns one instance of every configured backend, ordered by
//! [`StorageBackend::PRIORITY`]. In auto mode an upload walks that chain until
//! a backend accepts the file; in pinned mode only the pinned backend is used.
//! Deletes and URL resolution follow the backend recorded on the reference,
//! not the current selection.

use crate::keys::{generate_filename, generate_storage_key, normalize_content_type};
use crate::traits::{Storage, StorageError, StorageResult};
use crate::{StorageBackend, StorageMode, StorageReference, StoredFile};
use bytes::Bytes;
use campus_core::validation::{sanitize_filename, validate_category};
use campus_core::StorageConfig;
use std::sync::Arc;

/// Pick the backend uploads go to first. Pure: looks at configuration only.
pub fn select_backend(config: &StorageConfig) -> StorageBackend {
    match config.mode {
        StorageMode::Pinned(backend) => backend,
        StorageMode::Auto => StorageBackend::PRIORITY
            .into_iter()
            .find(|backend| config.is_configured(*backend))
            .unwrap_or(StorageBackend::Disk),
    }
}

/// Per-upload parameters
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UploadOptions {
    pub category: String,
    /// Explicit name; generated from a UUID when absent
    pub filename: Option<String>,
    pub content_type: String,
}

impl UploadOptions {
    pub fn new(category: impl Into<String>, content_type: impl Into<String>) -> Self {
        UploadOptions {
            category: category.into(),
            filename: None,
            content_type: content_type.into(),
        }
    }

    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = Some(filename.into());
        self
    }
}

#[derive(Clone)]
pub struct StorageRouter {
    mode: StorageMode,
    selected: StorageBackend,
    /// Configured backends in priority order
    backends: Vec<Arc<dyn Storage>>,
}

impl std::fmt::Debug for StorageRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageRouter")
            .field("mode", &self.mode)
            .field("selected", &self.selected)
            .field("backends", &self.configured_backends())
            .finish()
    }
}

impl StorageRouter {
    /// Build a router over already constructed backends.
    ///
    /// Auto mode needs the disk backend as the end of the chain; pinned mode
    /// needs the pinned backend. Anything else is a `ConfigError`.
    pub fn new(mode: StorageMode, backends: Vec<Arc<dyn Storage>>) -> StorageResult<Self> {
        let mut ordered: Vec<Arc<dyn Storage>> = Vec::with_capacity(backends.len());
        for backend in StorageBackend::PRIORITY {
            if let Some(storage) = backends.iter().find(|s| s.backend_type() == backend) {
                ordered.push(storage.clone());
            }
        }

        let selected = match mode {
            StorageMode::Pinned(backend) => {
                if !ordered.iter().any(|s| s.backend_type() == backend) {
                    return Err(StorageError::ConfigError(format!(
                        "storage mode pinned to {} but that backend is not configured",
                        backend
                    )));
                }
                backend
            }
            StorageMode::Auto => {
                if !ordered.iter().any(|s| s.backend_type() == StorageBackend::Disk) {
                    return Err(StorageError::ConfigError(
                        "auto storage mode requires the disk backend".to_string(),
                    ));
                }
                ordered[0].backend_type()
            }
        };

        Ok(StorageRouter {
            mode,
            selected,
            backends: ordered,
        })
    }

    pub fn mode(&self) -> StorageMode {
        self.mode
    }

    /// Backend uploads are attempted on first
    pub fn selected_backend(&self) -> StorageBackend {
        self.selected
    }

    pub fn configured_backends(&self) -> Vec<StorageBackend> {
        self.backends.iter().map(|s| s.backend_type()).collect()
    }

    pub fn backend(&self, backend: StorageBackend) -> Option<&Arc<dyn Storage>> {
        self.backends.iter().find(|s| s.backend_type() == backend)
    }

    fn upload_chain(&self) -> &[Arc<dyn Storage>] {
        match self.mode {
            StorageMode::Auto => &self.backends,
            StorageMode::Pinned(backend) => {
                let index = self
                    .backends
                    .iter()
                    .position(|s| s.backend_type() == backend)
                    .unwrap_or(0);
                &self.backends[index..=index]
            }
        }
    }

    fn storage_key(options: &UploadOptions) -> StorageResult<(String, String)> {
        validate_category(&options.category)
            .map_err(|e| StorageError::InvalidKey(e.to_string()))?;
        let filename = match options.filename.as_deref() {
            Some(name) => {
                sanitize_filename(name).map_err(|e| StorageError::InvalidKey(e.to_string()))?
            }
            None => generate_filename(&options.content_type),
        };
        let key = generate_storage_key(&options.category, &filename);
        Ok((key, filename))
    }

    /// Store `data` and return a reference naming the backend that took it.
    pub async fn upload(&self, data: Bytes, options: UploadOptions) -> StorageResult<StoredFile> {
        let (key, filename) = Self::storage_key(&options)?;
        let content_type = normalize_content_type(&options.content_type);
        let chain = self.upload_chain();

        let mut last_error = None;
        for (position, storage) in chain.iter().enumerate() {
            match storage.upload(&key, &content_type, data.clone()).await {
                Ok(url) => {
                    if position > 0 {
                        tracing::info!(
                            key = %key,
                            backend = %storage.backend_type(),
                            selected = %self.selected,
                            "Upload stored on fallback backend"
                        );
                    }
                    return Ok(StoredFile {
                        reference: StorageReference::new(storage.backend_type(), key, url),
                        category: options.category,
                        filename,
                    });
                }
                Err(e) if self.mode == StorageMode::Auto && e.is_fallback_eligible() => {
                    tracing::warn!(
                        error = %e,
                        key = %key,
                        backend = %storage.backend_type(),
                        "Storage backend failed, trying next backend"
                    );
                    last_error = Some(e);
                }
                Err(e) => {
                    tracing::error!(
                        error = %e,
                        key = %key,
                        backend = %storage.backend_type(),
                        "Storage upload failed"
                    );
                    return Err(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| {
            StorageError::ConfigError("no storage backend configured".to_string())
        }))
    }

    /// Upload to exactly `backend`, without fallback.
    pub async fn upload_to(
        &self,
        backend: StorageBackend,
        data: Bytes,
        options: UploadOptions,
    ) -> StorageResult<StoredFile> {
        let storage = self.backend(backend).ok_or_else(|| {
            StorageError::ConfigError(format!("{} backend is not configured", backend))
        })?;
        let (key, filename) = Self::storage_key(&options)?;
        let content_type = normalize_content_type(&options.content_type);
        let url = storage.upload(&key, &content_type, data).await?;
        Ok(StoredFile {
            reference: StorageReference::new(backend, key, url),
            category: options.category,
            filename,
        })
    }

    /// Delete the object behind `reference`, logging instead of failing.
    pub async fn delete(&self, reference: &StorageReference) {
        if let Err(e) = self.try_delete(reference).await {
            tracing::warn!(
                error = %e,
                key = %reference.id,
                backend = %reference.backend,
                "Failed to delete stored file, object may be orphaned"
            );
        }
    }

    /// Delete the object behind `reference`. A missing object counts as deleted.
    pub async fn try_delete(&self, reference: &StorageReference) -> StorageResult<()> {
        let Some(storage) = self.backend(reference.backend) else {
            tracing::warn!(
                key = %reference.id,
                backend = %reference.backend,
                "Reference points at an unconfigured backend, skipping delete"
            );
            return Ok(());
        };
        match storage.delete(&reference.id).await {
            Ok(()) | Err(StorageError::NotFound(_)) => Ok(()),
            Err(e) => Err(e),
        }
    }

    /// URL to hand to clients for `reference`.
    ///
    /// Disk and bucket URLs are derived from the key and the current base
    /// URL, so they follow configuration changes. Signed URLs carry their
    /// signature and are returned as stored. A reference whose backend is not
    /// configured keeps its stored URL.
    pub fn resolve_url(&self, reference: &StorageReference) -> String {
        let storage = match self.backend(reference.backend) {
            Some(storage) => storage,
            None => return reference.url.clone(),
        };
        if reference.backend == StorageBackend::RemoteSigned && reference.has_absolute_url() {
            return reference.url.clone();
        }
        storage.public_url(&reference.id)
    }

    pub async fn download(&self, reference: &StorageReference) -> StorageResult<Vec<u8>> {
        self.routed(reference)?.download(&reference.id).await
    }

    pub async fn exists(&self, reference: &StorageReference) -> StorageResult<bool> {
        self.routed(reference)?.exists(&reference.id).await
    }

    fn routed(&self, reference: &StorageReference) -> StorageResult<&Arc<dyn Storage>> {
        self.backend(reference.backend).ok_or_else(|| {
            StorageError::ConfigError(format!("{} backend is not configured", reference.backend))
        })
    }
}
