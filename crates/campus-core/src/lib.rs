//! Campus Core Library
//!
//! Domain records, error types, configuration and validation shared by the
//! storage, persistence, service and API crates.

pub mod config;
pub mod error;
pub mod models;
pub mod storage_types;
pub mod validation;

// Re-export commonly used types
pub use config::{BaseConfig, Config, StorageConfig};
pub use error::{AppError, ErrorInfo, LogLevel};
pub use storage_types::{StorageBackend, StorageMode, StorageReference, StoredFile};
