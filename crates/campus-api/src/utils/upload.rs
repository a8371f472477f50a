//! Common utilities for file upload handlers

use axum::extract::multipart::{Field, MultipartError};
use axum::extract::Multipart;
use axum::http::StatusCode;
use bytes::Bytes;
use campus_core::models::{MediaKind, MediaRecord, MediaSlot};
use campus_core::{AppError, Config};
use campus_services::FileUpload;
use campus_storage::keys::normalize_content_type;

const IMAGE_CONTENT_TYPES: &[&str] = &["image/jpeg", "image/png", "image/gif", "image/webp"];
const VIDEO_CONTENT_TYPES: &[&str] = &["video/mp4", "video/webm", "video/quicktime"];
const DOCUMENT_CONTENT_TYPES: &[&str] = &["application/pdf"];

/// Field carrying the JSON draft in record-creation forms
pub const DATA_FIELD: &str = "data";

/// Per-kind size caps in bytes
#[derive(Clone, Copy, Debug)]
pub struct UploadLimits {
    pub image: usize,
    pub video: usize,
    pub document: usize,
}

impl UploadLimits {
    pub fn from_config(config: &Config) -> Self {
        UploadLimits {
            image: config.base.max_file_size_bytes,
            video: config.base.max_video_size_bytes,
            document: config.base.max_document_size_bytes,
        }
    }

    pub fn max_for(&self, kind: MediaKind) -> usize {
        match kind {
            MediaKind::Image => self.image,
            MediaKind::Video => self.video,
            MediaKind::Document => self.document,
        }
    }

    /// Largest request body any upload may need
    pub fn largest(&self) -> usize {
        self.image.max(self.video).max(self.document)
    }
}

pub fn allowed_content_types(kind: MediaKind) -> &'static [&'static str] {
    match kind {
        MediaKind::Image => IMAGE_CONTENT_TYPES,
        MediaKind::Video => VIDEO_CONTENT_TYPES,
        MediaKind::Document => DOCUMENT_CONTENT_TYPES,
    }
}

/// Validate content type against the slot's allowlist. Returns the normalized type.
pub fn validate_content_type(content_type: &str, kind: MediaKind) -> Result<String, AppError> {
    let normalized = normalize_content_type(content_type);
    let allowed = allowed_content_types(kind);
    if !allowed.contains(&normalized.as_str()) {
        return Err(AppError::InvalidInput(format!(
            "Invalid content type '{}'. Allowed types: {}",
            normalized,
            allowed.join(", ")
        )));
    }
    Ok(normalized)
}

/// Validate file size
pub fn validate_file_size(file_size: usize, max_size: usize) -> Result<(), AppError> {
    if file_size > max_size {
        return Err(AppError::PayloadTooLarge(format!(
            "File size exceeds maximum allowed size of {} MB",
            max_size / 1024 / 1024
        )));
    }
    Ok(())
}

fn multipart_error(e: MultipartError) -> AppError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge(e.body_text())
    } else {
        AppError::InvalidInput(format!("Failed to read multipart: {}", e.body_text()))
    }
}

async fn read_file(field: Field<'_>, slot: MediaSlot, limits: &UploadLimits) -> Result<FileUpload, AppError> {
    let content_type = field
        .content_type()
        .map(str::to_string)
        .unwrap_or_else(|| "application/octet-stream".to_string());
    let content_type = validate_content_type(&content_type, slot.kind())?;

    let data = field.bytes().await.map_err(multipart_error)?;
    if data.is_empty() {
        return Err(AppError::InvalidInput(format!("Empty file in '{}'", slot)));
    }
    validate_file_size(data.len(), limits.max_for(slot.kind()))?;

    Ok(FileUpload::new(content_type, data))
}

/// Record-creation form: the JSON draft plus files keyed by slot name
#[derive(Debug, Default)]
pub struct RecordForm {
    pub data: Option<Bytes>,
    pub files: Vec<(MediaSlot, FileUpload)>,
}

/// Read a creation form for `T`. Unknown fields and disallowed files are rejected
/// before anything is stored.
pub async fn extract_record_form<T: MediaRecord>(
    mut multipart: Multipart,
    limits: &UploadLimits,
) -> Result<RecordForm, AppError> {
    let mut form = RecordForm::default();

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().unwrap_or_default().to_string();

        if name == DATA_FIELD {
            if form.data.is_some() {
                return Err(AppError::InvalidInput("Duplicate 'data' field".to_string()));
            }
            form.data = Some(field.bytes().await.map_err(multipart_error)?);
            continue;
        }

        let slot = name
            .parse::<MediaSlot>()
            .ok()
            .filter(|slot| T::supports(*slot))
            .ok_or_else(|| {
                AppError::InvalidInput(format!("Unexpected field '{}' for {}", name, T::LABEL))
            })?;
        let file = read_file(field, slot, limits).await?;
        form.files.push((slot, file));
    }

    Ok(form)
}

/// Read every file sent under `field_name`; other fields are rejected.
pub async fn extract_files(
    mut multipart: Multipart,
    field_name: &str,
    slot: MediaSlot,
    limits: &UploadLimits,
) -> Result<Vec<FileUpload>, AppError> {
    let mut files = Vec::new();

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().unwrap_or_default().to_string();
        if name != field_name {
            return Err(AppError::InvalidInput(format!(
                "Unexpected field '{}'; send files as '{}'",
                name, field_name
            )));
        }
        files.push(read_file(field, slot, limits).await?);
    }

    if files.is_empty() {
        return Err(AppError::InvalidInput(format!(
            "No file provided in '{}'",
            field_name
        )));
    }
    Ok(files)
}

/// Read exactly one file sent as `file`.
pub async fn extract_single_file(
    multipart: Multipart,
    slot: MediaSlot,
    limits: &UploadLimits,
) -> Result<FileUpload, AppError> {
    let mut files = extract_files(multipart, "file", slot, limits).await?;
    if files.len() > 1 {
        return Err(AppError::InvalidInput(
            "Multiple file fields are not allowed; send exactly one field named 'file'"
                .to_string(),
        ));
    }
    files
        .pop()
        .ok_or_else(|| AppError::InvalidInput("No file provided".to_string()))
}
