//! Input validation shared by the storage and API crates

use std::sync::OnceLock;

use regex::Regex;

use crate::error::AppError;

const MAX_FILENAME_LENGTH: usize = 255;
const MAX_CATEGORY_LENGTH: usize = 64;

fn category_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[a-z0-9][a-z0-9_-]*$").expect("valid category regex"))
}

/// Validate a storage category (logical folder such as `courses`).
pub fn validate_category(category: &str) -> Result<(), AppError> {
    if category.len() > MAX_CATEGORY_LENGTH || !category_pattern().is_match(category) {
        return Err(AppError::InvalidInput(format!(
            "Invalid storage category '{}': use lowercase letters, digits, '-' or '_'",
            category
        )));
    }
    Ok(())
}

/// Sanitize filename to prevent path traversal and invalid characters.
/// Returns an error if the filename contains path traversal attempts.
pub fn sanitize_filename(filename: &str) -> Result<String, AppError> {
    let path = std::path::Path::new(filename);
    let filename_only = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(filename);

    if filename.contains("..") {
        return Err(AppError::InvalidInput(
            "Filename contains invalid path traversal".to_string(),
        ));
    }

    let sanitized: String = filename_only
        .chars()
        .take(MAX_FILENAME_LENGTH)
        .map(|c| {
            if c.is_alphanumeric() || c == '.' || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();

    if sanitized.trim().is_empty() || sanitized.len() < 3 {
        return Ok("file".to_string());
    }

    Ok(sanitized)
}
