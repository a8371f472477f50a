use async_trait::async_trait;
use campus_core::models::MediaRecord;
use campus_core::AppError;
use uuid::Uuid;

/// Storage of one record collection
#[async_trait]
pub trait RecordRepository<T: MediaRecord>: Send + Sync {
    async fn insert(&self, record: &T) -> Result<(), AppError>;

    async fn get(&self, id: Uuid) -> Result<Option<T>, AppError>;

    /// Overwrite an existing record. `NotFound` if it was deleted meanwhile.
    async fn update(&self, record: &T) -> Result<(), AppError>;

    /// Returns whether a record was removed.
    async fn delete(&self, id: Uuid) -> Result<bool, AppError>;

    /// Oldest first.
    async fn list(&self, limit: i64, offset: i64) -> Result<Vec<T>, AppError>;

    async fn count(&self) -> Result<i64, AppError>;
}

pub(crate) fn not_found<T: MediaRecord>(id: Uuid) -> AppError {
    AppError::NotFound(format!("{} {} not found", T::LABEL, id))
}
