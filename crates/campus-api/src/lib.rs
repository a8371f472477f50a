//! Campus API Library
//!
//! HTTP handlers, extractors and application setup for the media API.

pub mod auth;
pub mod constants;
pub mod error;
mod handlers;
pub mod setup;
pub mod state;
pub mod telemetry;
mod utils;

// Re-exports
pub use error::{ErrorResponse, HttpAppError};
pub use state::{AppState, Collection};
