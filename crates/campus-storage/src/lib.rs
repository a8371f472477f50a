//! Campus Storage Library
//!
//! Storage abstraction, the three backends (local disk, S3-protocol bucket,
//! GCS signed URLs) and the router that picks between them with fallback.
//!
//! # Storage key format
//!
//! Keys are `{category}/{filename}` where the category is the owning
//! collection (`courses`, `books`, ...). Keys must not contain `..` or a
//! leading `/`. Key generation is centralized in the `keys` module so all
//! backends stay consistent.

#[cfg(feature = "storage-remote")]
pub mod bucket;
pub mod factory;
pub mod keys;
pub mod local;
pub mod router;
#[cfg(feature = "storage-remote")]
pub mod signed;
#[cfg(any(test, feature = "testing"))]
pub mod testing;
pub mod traits;

// Re-export commonly used types
#[cfg(feature = "storage-remote")]
pub use bucket::BucketStorage;
pub use campus_core::{StorageBackend, StorageMode, StorageReference, StoredFile};
pub use factory::create_router;
pub use local::LocalStorage;
pub use router::{select_backend, StorageRouter, UploadOptions};
#[cfg(feature = "storage-remote")]
pub use signed::{SignedUrlStorage, UrlSigner};
pub use traits::{Storage, StorageError, StorageResult};
