//! Shared key generation for storage backends.
//!
//! Key format: `{category}/{filename}`. Generated filenames are a v4 UUID plus
//! an extension derived from the content type, so two uploads never collide
//! and no counter is shared between concurrent requests.

use uuid::Uuid;

use crate::traits::{StorageError, StorageResult};

const EXTENSIONS: &[(&str, &str)] = &[
    ("image/jpeg", "jpg"),
    ("image/jpg", "jpg"),
    ("image/png", "png"),
    ("image/gif", "gif"),
    ("image/webp", "webp"),
    ("image/svg+xml", "svg"),
    ("video/mp4", "mp4"),
    ("video/webm", "webm"),
    ("video/quicktime", "mov"),
    ("application/pdf", "pdf"),
    ("text/plain", "txt"),
];

/// Strip MIME parameters and lowercase ("Image/JPEG; q=1" -> "image/jpeg").
pub fn normalize_content_type(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or(content_type)
        .trim()
        .to_lowercase()
}

/// File extension for a content type, `bin` when unknown.
pub fn extension_for(content_type: &str) -> &'static str {
    let normalized = normalize_content_type(content_type);
    EXTENSIONS
        .iter()
        .find(|(mime, _)| *mime == normalized)
        .map(|(_, ext)| *ext)
        .unwrap_or("bin")
}

/// Content type for a key, guessed from its extension.
pub fn content_type_for_key(storage_key: &str) -> &'static str {
    let extension = storage_key
        .rsplit('/')
        .next()
        .and_then(|name| name.rsplit_once('.'))
        .map(|(_, ext)| ext.to_lowercase());
    match extension.as_deref() {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some(ext) => EXTENSIONS
            .iter()
            .find(|(_, known)| *known == ext)
            .map(|(mime, _)| *mime)
            .unwrap_or("application/octet-stream"),
        None => "application/octet-stream",
    }
}

/// Opaque, collision-free filename for an upload without an explicit name.
pub fn generate_filename(content_type: &str) -> String {
    format!("{}.{}", Uuid::new_v4().simple(), extension_for(content_type))
}

/// Generate a storage key for the given category and filename.
pub fn generate_storage_key(category: &str, filename: &str) -> String {
    format!("{}/{}", category, filename)
}

/// Reject keys that could escape the backend's namespace.
pub fn validate_key(storage_key: &str) -> StorageResult<()> {
    if storage_key.is_empty()
        || storage_key.contains("..")
        || storage_key.starts_with('/')
        || storage_key.contains('\\')
    {
        return Err(StorageError::InvalidKey(format!(
            "Storage key '{}' contains invalid characters",
            storage_key
        )));
    }
    Ok(())
}

/// URL-encode each path segment of a key, keeping the separators.
pub fn encode_key(storage_key: &str) -> String {
    storage_key
        .split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}
