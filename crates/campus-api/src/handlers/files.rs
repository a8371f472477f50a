//! Serves objects stored on the disk backend, so the URLs it hands out resolve.

use crate::error::HttpAppError;
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    http::header,
    response::IntoResponse,
};
use campus_core::{AppError, StorageBackend};
use campus_storage::keys::content_type_for_key;
use campus_storage::StorageError;
use std::sync::Arc;

pub async fn serve_file(
    State(state): State<Arc<AppState>>,
    Path(key): Path<String>,
) -> Result<impl IntoResponse, HttpAppError> {
    let disk = state
        .storage
        .backend(StorageBackend::Disk)
        .ok_or_else(|| AppError::NotFound("File not found".to_string()))?;

    let data = disk.download(&key).await.map_err(|e| match e {
        StorageError::NotFound(_) => AppError::NotFound("File not found".to_string()),
        other => other.into(),
    })?;

    Ok((
        [
            (header::CONTENT_TYPE, content_type_for_key(&key)),
            (header::CACHE_CONTROL, "public, max-age=31536000, immutable"),
        ],
        data,
    ))
}
