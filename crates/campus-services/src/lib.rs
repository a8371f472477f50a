//! Campus Services Library
//!
//! Business operations that coordinate storage and persistence.

pub mod media_lifecycle;
pub mod record_locks;

pub use media_lifecycle::{FileUpload, MediaLifecycleService};
pub use record_locks::RecordLocks;
