//! Error types module
//!
//! `AppError` is the one error every layer above storage returns. Each variant
//! maps to a fixed [`ErrorInfo`] describing how the HTTP layer renders and logs it.
//!
//! The `Database` variant and `From<sqlx::Error>` are gated behind the `sqlx` feature.

#[cfg(feature = "sqlx")]
use sqlx::Error as SqlxError;

/// How loudly an error is logged
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Caller mistakes: bad input, missing records, denied access
    Debug,
    /// Failures of the service or its dependencies
    Error,
}

/// Presentation of one error variant
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ErrorInfo {
    pub status: u16,
    /// Machine-readable code, e.g. `STORAGE_ERROR`
    pub code: &'static str,
    pub recoverable: bool,
    pub suggested_action: Option<&'static str>,
    /// Message and cause chain stay out of responses
    pub sensitive: bool,
    pub log_level: LogLevel,
}

const RETRY: Option<&str> = Some("Retry after a short delay");

impl ErrorInfo {
    const fn caller(status: u16, code: &'static str, action: &'static str) -> Self {
        ErrorInfo {
            status,
            code,
            recoverable: false,
            suggested_action: Some(action),
            sensitive: false,
            log_level: LogLevel::Debug,
        }
    }

    const fn server(status: u16, code: &'static str) -> Self {
        ErrorInfo {
            status,
            code,
            recoverable: true,
            suggested_action: RETRY,
            sensitive: true,
            log_level: LogLevel::Error,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[cfg(feature = "sqlx")]
    #[error("Database error: {0}")]
    Database(#[source] SqlxError),

    #[cfg(not(feature = "sqlx"))]
    #[error("Database error: {0}")]
    Database(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("File too large: {0}")]
    PayloadTooLarge(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Internal error with source")]
    InternalWithSource {
        message: String,
        #[source]
        source: anyhow::Error,
    },
}

#[cfg(feature = "sqlx")]
impl From<SqlxError> for AppError {
    fn from(err: SqlxError) -> Self {
        AppError::Database(err)
    }
}

/// Draft validation failures are the caller's to fix
impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::InvalidInput(format!("Validation error: {}", err))
    }
}

impl AppError {
    pub fn info(&self) -> ErrorInfo {
        match self {
            AppError::Database(_) => ErrorInfo::server(500, "DATABASE_ERROR"),
            AppError::Storage(_) => ErrorInfo::server(502, "STORAGE_ERROR"),
            AppError::Internal(_) | AppError::InternalWithSource { .. } => {
                ErrorInfo::server(500, "INTERNAL_ERROR")
            }
            AppError::InvalidInput(_) => ErrorInfo::caller(
                400,
                "INVALID_INPUT",
                "Check request parameters and try again",
            ),
            AppError::NotFound(_) => {
                ErrorInfo::caller(404, "NOT_FOUND", "Verify the resource ID exists")
            }
            AppError::PayloadTooLarge(_) => ErrorInfo::caller(
                413,
                "PAYLOAD_TOO_LARGE",
                "Reduce file size and try again",
            ),
            AppError::Unauthorized(_) => {
                ErrorInfo::caller(401, "UNAUTHORIZED", "Sign in and retry")
            }
            AppError::Forbidden(_) => ErrorInfo::caller(
                403,
                "FORBIDDEN",
                "Only the owner or an administrator can modify this resource",
            ),
        }
    }

    /// Variant name, shown in non-production error bodies
    pub fn error_type(&self) -> &'static str {
        match self {
            AppError::Database(_) => "Database",
            AppError::Storage(_) => "Storage",
            AppError::InvalidInput(_) => "InvalidInput",
            AppError::NotFound(_) => "NotFound",
            AppError::PayloadTooLarge(_) => "PayloadTooLarge",
            AppError::Unauthorized(_) => "Unauthorized",
            AppError::Forbidden(_) => "Forbidden",
            AppError::Internal(_) | AppError::InternalWithSource { .. } => "Internal",
        }
    }

    /// Message safe to return to any caller
    pub fn client_message(&self) -> String {
        match self {
            AppError::Database(_) => "Failed to access database".to_string(),
            AppError::Storage(_) => "Could not store file".to_string(),
            AppError::Internal(_) | AppError::InternalWithSource { .. } => {
                "Internal server error".to_string()
            }
            AppError::InvalidInput(msg)
            | AppError::NotFound(msg)
            | AppError::PayloadTooLarge(msg)
            | AppError::Unauthorized(msg)
            | AppError::Forbidden(msg) => msg.clone(),
        }
    }

    /// Display text followed by up to five causes
    pub fn detailed_message(&self) -> String {
        use std::error::Error;

        let mut details = self.to_string();
        let mut source = self.source();
        let mut depth = 0;
        while let Some(err) = source {
            depth += 1;
            if depth > 5 {
                details.push_str("\n  ... (truncated)");
                break;
            }
            details.push_str(&format!("\n  Caused by: {}", err));
            source = err.source();
        }
        details
    }
}
