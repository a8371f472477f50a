use async_trait::async_trait;
use campus_core::models::MediaRecord;
use campus_core::AppError;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::repository::{not_found, RecordRepository};

/// Process-local repository, insertion ordered
pub struct InMemoryRepository<T> {
    records: RwLock<Vec<T>>,
}

impl<T> Default for InMemoryRepository<T> {
    fn default() -> Self {
        InMemoryRepository {
            records: RwLock::new(Vec::new()),
        }
    }
}

impl<T: MediaRecord> InMemoryRepository<T> {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl<T: MediaRecord> RecordRepository<T> for InMemoryRepository<T> {
    async fn insert(&self, record: &T) -> Result<(), AppError> {
        let mut records = self.records.write().await;
        if records.iter().any(|r| r.id() == record.id()) {
            return Err(AppError::InvalidInput(format!(
                "{} {} already exists",
                T::LABEL,
                record.id()
            )));
        }
        records.push(record.clone());
        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<Option<T>, AppError> {
        Ok(self
            .records
            .read()
            .await
            .iter()
            .find(|r| r.id() == id)
            .cloned())
    }

    async fn update(&self, record: &T) -> Result<(), AppError> {
        let mut records = self.records.write().await;
        let slot = records
            .iter_mut()
            .find(|r| r.id() == record.id())
            .ok_or_else(|| not_found::<T>(record.id()))?;
        *slot = record.clone();
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        let mut records = self.records.write().await;
        let before = records.len();
        records.retain(|r| r.id() != id);
        Ok(records.len() != before)
    }

    async fn list(&self, limit: i64, offset: i64) -> Result<Vec<T>, AppError> {
        let records = self.records.read().await;
        Ok(records
            .iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .cloned()
            .collect())
    }

    async fn count(&self) -> Result<i64, AppError> {
        Ok(self.records.read().await.len() as i64)
    }
}
