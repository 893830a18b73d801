//! Session repository implementation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use forum_core::error::{AppError, ErrorKind};
use forum_core::result::AppResult;
use forum_core::types::{SessionId, UserId};
use forum_entity::session::SessionRecord;

use crate::store::SessionStore;

/// Repository for stored sessions.
#[derive(Debug, Clone)]
pub struct PgSessionStore {
    pool: PgPool,
}

impl PgSessionStore {
    /// Create a new session repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct SessionRow {
    id: Uuid,
    user_id: Option<Uuid>,
    created_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
    absolute_expiry: DateTime<Utc>,
    last_activity: DateTime<Utc>,
}

impl From<SessionRow> for SessionRecord {
    fn from(row: SessionRow) -> Self {
        Self {
            id: SessionId::from_uuid(row.id),
            user_id: row.user_id.map(UserId::from_uuid),
            created_at: row.created_at,
            expires_at: row.expires_at,
            absolute_expiry: row.absolute_expiry,
            last_activity: row.last_activity,
        }
    }
}

#[async_trait]
impl SessionStore for PgSessionStore {
    async fn insert(&self, session: &SessionRecord) -> AppResult<()> {
        sqlx::query(
            "INSERT INTO sessions (id, user_id, created_at, expires_at, absolute_expiry, last_activity) \
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(session.id.into_uuid())
        .bind(session.user_id.map(UserId::into_uuid))
        .bind(session.created_at)
        .bind(session.expires_at)
        .bind(session.absolute_expiry)
        .bind(session.last_activity)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to insert session", e))?;
        Ok(())
    }

    async fn find_by_id(&self, id: SessionId) -> AppResult<Option<SessionRecord>> {
        sqlx::query_as::<_, SessionRow>("SELECT * FROM sessions WHERE id = $1")
            .bind(id.into_uuid())
            .fetch_optional(&self.pool)
            .await
            .map(|row| row.map(SessionRecord::from))
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find session", e))
    }

    async fn save(&self, session: &SessionRecord) -> AppResult<()> {
        sqlx::query(
            "UPDATE sessions SET expires_at = $2, last_activity = $3 WHERE id = $1",
        )
        .bind(session.id.into_uuid())
        .bind(session.expires_at)
        .bind(session.last_activity)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to save session", e))?;
        Ok(())
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> AppResult<u64> {
        let result =
            sqlx::query("DELETE FROM sessions WHERE expires_at < $1 OR absolute_expiry < $1")
                .bind(now)
                .execute(&self.pool)
                .await
                .map_err(|e| {
                    AppError::with_source(ErrorKind::Database, "Failed to cleanup sessions", e)
                })?;
        Ok(result.rows_affected())
    }
}
