//! Data models for the application
//!
//! Every record type that carries files implements [`MediaRecord`], which is
//! what the lifecycle service and the repositories are generic over.

mod actor;
mod course;
mod document;
mod media;
mod notification;
mod scholarship;

pub use actor::*;
pub use course::*;
pub use document::*;
pub use media::*;
pub use notification::*;
pub use scholarship::*;
