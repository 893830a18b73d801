//! Ephemeral record repository implementation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use forum_core::error::{AppError, ErrorKind};
use forum_core::result::AppResult;
use forum_core::types::RecordId;
use forum_entity::ephemeral::{EphemeralKind, EphemeralRecord};

use crate::store::EphemeralStore;

/// Repository for short-lived records.
#[derive(Debug, Clone)]
pub struct PgEphemeralStore {
    pool: PgPool,
}

impl PgEphemeralStore {
    /// Create a new ephemeral record repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct EphemeralRow {
    id: Uuid,
    kind: String,
    payload: serde_json::Value,
    created_at: DateTime<Utc>,
}

impl TryFrom<EphemeralRow> for EphemeralRecord {
    type Error = AppError;

    fn try_from(row: EphemeralRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: RecordId::from_uuid(row.id),
            kind: row.kind.parse()?,
            payload: row.payload,
            created_at: row.created_at,
        })
    }
}

#[async_trait]
impl EphemeralStore for PgEphemeralStore {
    async fn insert(&self, record: &EphemeralRecord) -> AppResult<()> {
        sqlx::query(
            "INSERT INTO ephemeral_records (id, kind, payload, created_at) VALUES ($1, $2, $3, $4)",
        )
        .bind(record.id.into_uuid())
        .bind(record.kind.as_str())
        .bind(&record.payload)
        .bind(record.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to insert record", e))?;
        Ok(())
    }

    async fn delete_older_than(
        &self,
        kind: EphemeralKind,
        cutoff: DateTime<Utc>,
    ) -> AppResult<u64> {
        // One bulk predicate on the stored timestamp; concurrent inserts of
        // younger records are unaffected.
        let result =
            sqlx::query("DELETE FROM ephemeral_records WHERE kind = $1 AND created_at < $2")
                .bind(kind.as_str())
                .bind(cutoff)
                .execute(&self.pool)
                .await
                .map_err(|e| {
                    AppError::with_source(ErrorKind::Database, "Failed to delete records", e)
                })?;
        Ok(result.rows_affected())
    }

    async fn count_by_kind(&self, kind: EphemeralKind) -> AppResult<u64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM ephemeral_records WHERE kind = $1")
                .bind(kind.as_str())
                .fetch_one(&self.pool)
                .await
                .map_err(|e| {
                    AppError::with_source(ErrorKind::Database, "Failed to count records", e)
                })?;
        Ok(count as u64)
    }

    async fn find_by_kind(&self, kind: EphemeralKind) -> AppResult<Vec<EphemeralRecord>> {
        let rows = sqlx::query_as::<_, EphemeralRow>(
            "SELECT * FROM ephemeral_records WHERE kind = $1 ORDER BY created_at ASC",
        )
        .bind(kind.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list records", e))?;

        rows.into_iter().map(EphemeralRecord::try_from).collect()
    }
}
