use async_trait::async_trait;
use campus_core::models::MediaRecord;
use campus_core::AppError;
use sqlx::types::Json;
use sqlx::{PgPool, Postgres};
use std::marker::PhantomData;
use uuid::Uuid;

use crate::repository::{not_found, RecordRepository};

/// Repository over the shared `records` table, scoped to `T::COLLECTION`
pub struct PgRecordRepository<T> {
    pool: PgPool,
    _record: PhantomData<fn() -> T>,
}

impl<T> Clone for PgRecordRepository<T> {
    fn clone(&self) -> Self {
        PgRecordRepository {
            pool: self.pool.clone(),
            _record: PhantomData,
        }
    }
}

impl<T: MediaRecord> PgRecordRepository<T> {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            _record: PhantomData,
        }
    }
}

#[async_trait]
impl<T: MediaRecord> RecordRepository<T> for PgRecordRepository<T> {
    #[tracing::instrument(skip(self, record), fields(db.table = "records", db.operation = "insert", db.collection = T::COLLECTION, db.record_id = %record.id()))]
    async fn insert(&self, record: &T) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO records (collection, id, owner_id, body, created_at, updated_at)
            VALUES ($1, $2, $3, $4, NOW(), NOW())
            "#,
        )
        .bind(T::COLLECTION)
        .bind(record.id())
        .bind(record.owner_id())
        .bind(Json(record))
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    #[tracing::instrument(skip(self), fields(db.table = "records", db.operation = "select", db.collection = T::COLLECTION, db.record_id = %id))]
    async fn get(&self, id: Uuid) -> Result<Option<T>, AppError> {
        let body = sqlx::query_scalar::<Postgres, Json<T>>(
            "SELECT body FROM records WHERE collection = $1 AND id = $2",
        )
        .bind(T::COLLECTION)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(body.map(|Json(record)| record))
    }

    #[tracing::instrument(skip(self, record), fields(db.table = "records", db.operation = "update", db.collection = T::COLLECTION, db.record_id = %record.id()))]
    async fn update(&self, record: &T) -> Result<(), AppError> {
        let result = sqlx::query(
            r#"
            UPDATE records
            SET body = $3, updated_at = NOW()
            WHERE collection = $1 AND id = $2
            "#,
        )
        .bind(T::COLLECTION)
        .bind(record.id())
        .bind(Json(record))
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(not_found::<T>(record.id()));
        }
        Ok(())
    }

    #[tracing::instrument(skip(self), fields(db.table = "records", db.operation = "delete", db.collection = T::COLLECTION, db.record_id = %id))]
    async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM records WHERE collection = $1 AND id = $2")
            .bind(T::COLLECTION)
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    #[tracing::instrument(skip(self), fields(db.table = "records", db.operation = "select", db.collection = T::COLLECTION))]
    async fn list(&self, limit: i64, offset: i64) -> Result<Vec<T>, AppError> {
        let bodies = sqlx::query_scalar::<Postgres, Json<T>>(
            r#"
            SELECT body FROM records
            WHERE collection = $1
            ORDER BY created_at ASC, id ASC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(T::COLLECTION)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(bodies.into_iter().map(|Json(record)| record).collect())
    }

    async fn count(&self) -> Result<i64, AppError> {
        let count = sqlx::query_scalar::<Postgres, i64>(
            "SELECT COUNT(*) FROM records WHERE collection = $1",
        )
        .bind(T::COLLECTION)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }
}
