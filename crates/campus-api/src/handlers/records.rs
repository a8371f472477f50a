//! Record handlers, generic over every collection.
//!
//! Each collection mounts these under `/api/v1/<collection>`; the record type
//! picks the service out of [`AppState`] through [`Collection`].

use crate::auth::CurrentActor;
use crate::constants::{DEFAULT_PAGE_LIMIT, MAX_PAGE_LIMIT};
use crate::error::HttpAppError;
use crate::state::{AppState, Collection};
use crate::utils::upload::{extract_record_form, extract_single_file, UploadLimits};
use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use campus_core::models::MediaSlot;
use campus_core::AppError;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct PaginationQuery {
    #[serde(default)]
    pub limit: Option<i64>,
    #[serde(default)]
    pub offset: Option<i64>,
}

impl PaginationQuery {
    fn limit(&self) -> i64 {
        self.limit
            .unwrap_or(DEFAULT_PAGE_LIMIT)
            .clamp(1, MAX_PAGE_LIMIT)
    }

    fn offset(&self) -> i64 {
        self.offset.unwrap_or(0).max(0)
    }
}

#[derive(Debug, Serialize)]
pub struct Page<T> {
    pub data: Vec<T>,
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
}

fn parse_slot(raw: &str) -> Result<MediaSlot, AppError> {
    raw.parse::<MediaSlot>()
        .map_err(|e| AppError::InvalidInput(e.to_string()))
}

#[tracing::instrument(skip(state, actor, multipart), fields(collection = T::COLLECTION, user_id = %actor.user_id))]
pub async fn create_record<T: Collection>(
    State(state): State<Arc<AppState>>,
    CurrentActor(actor): CurrentActor,
    multipart: Multipart,
) -> Result<impl IntoResponse, HttpAppError> {
    let limits = UploadLimits::from_config(&state.config);
    let form = extract_record_form::<T>(multipart, &limits).await?;

    let data = form
        .data
        .ok_or_else(|| AppError::InvalidInput("Missing 'data' field".to_string()))?;
    let draft: T::Draft = serde_json::from_slice(&data)
        .map_err(|e| AppError::InvalidInput(format!("Invalid {} data: {}", T::LABEL, e)))?;

    let record = T::service(&state).create(&actor, draft, form.files).await?;

    Ok((StatusCode::CREATED, Json(record)))
}

pub async fn list_records<T: Collection>(
    State(state): State<Arc<AppState>>,
    Query(pagination): Query<PaginationQuery>,
) -> Result<impl IntoResponse, HttpAppError> {
    let limit = pagination.limit();
    let offset = pagination.offset();
    let service = T::service(&state);

    let data = service.list(limit, offset).await?;
    let total = service.count().await?;

    Ok(Json(Page {
        data,
        total,
        limit,
        offset,
    }))
}

pub async fn get_record<T: Collection>(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpAppError> {
    let record = T::service(&state).get(id).await?;
    Ok(Json(record))
}

#[tracing::instrument(skip(state, actor, multipart), fields(collection = T::COLLECTION, record_id = %id))]
pub async fn replace_media<T: Collection>(
    State(state): State<Arc<AppState>>,
    CurrentActor(actor): CurrentActor,
    Path((id, slot)): Path<(Uuid, String)>,
    multipart: Multipart,
) -> Result<impl IntoResponse, HttpAppError> {
    let slot = parse_slot(&slot)?;
    if !T::supports(slot) || slot == MediaSlot::Images {
        return Err(AppError::InvalidInput(format!(
            "{} has no '{}' slot",
            T::LABEL,
            slot
        ))
        .into());
    }

    let limits = UploadLimits::from_config(&state.config);
    let file = extract_single_file(multipart, slot, &limits).await?;

    let record = T::service(&state)
        .replace_media(&actor, id, slot, file)
        .await?;
    Ok(Json(record))
}

#[tracing::instrument(skip(state, actor), fields(collection = T::COLLECTION, record_id = %id))]
pub async fn remove_media<T: Collection>(
    State(state): State<Arc<AppState>>,
    CurrentActor(actor): CurrentActor,
    Path((id, slot)): Path<(Uuid, String)>,
) -> Result<impl IntoResponse, HttpAppError> {
    let slot = parse_slot(&slot)?;
    let record = T::service(&state).remove_media(&actor, id, slot).await?;
    Ok(Json(record))
}

#[tracing::instrument(skip(state, actor), fields(collection = T::COLLECTION, record_id = %id))]
pub async fn delete_record<T: Collection>(
    State(state): State<Arc<AppState>>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpAppError> {
    T::service(&state).delete(&actor, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
