//! Scholarship gallery handlers

use crate::auth::CurrentActor;
use crate::error::HttpAppError;
use crate::state::AppState;
use crate::utils::upload::{extract_files, UploadLimits};
use axum::{
    extract::{Multipart, Path, Query, State},
    response::IntoResponse,
    Json,
};
use campus_core::models::{ImageSelector, MediaSlot};
use campus_core::AppError;
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

/// Exactly one of `id` (storage key) or `url` selects the image.
#[derive(Debug, Deserialize)]
pub struct ImageQuery {
    pub id: Option<String>,
    pub url: Option<String>,
}

impl ImageQuery {
    fn selector(self) -> Result<ImageSelector, AppError> {
        match (self.id, self.url) {
            (Some(id), None) => Ok(ImageSelector::Id(id)),
            (None, Some(url)) => Ok(ImageSelector::Url(url)),
            _ => Err(AppError::InvalidInput(
                "Provide exactly one of 'id' or 'url'".to_string(),
            )),
        }
    }
}

#[tracing::instrument(skip(state, actor, multipart), fields(scholarship_id = %id))]
pub async fn add_images(
    State(state): State<Arc<AppState>>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<Uuid>,
    multipart: Multipart,
) -> Result<impl IntoResponse, HttpAppError> {
    let limits = UploadLimits::from_config(&state.config);
    let files = extract_files(multipart, MediaSlot::Images.as_str(), MediaSlot::Images, &limits)
        .await?;

    let scholarship = state.scholarships.add_images(&actor, id, files).await?;
    Ok(Json(scholarship))
}

#[tracing::instrument(skip(state, actor, query), fields(scholarship_id = %id))]
pub async fn remove_image(
    State(state): State<Arc<AppState>>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<Uuid>,
    Query(query): Query<ImageQuery>,
) -> Result<impl IntoResponse, HttpAppError> {
    let selector = query.selector()?;
    let scholarship = state
        .scholarships
        .remove_image(&actor, id, &selector)
        .await?;
    Ok(Json(scholarship))
}
