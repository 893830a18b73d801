//! Forum setting repository implementation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use forum_core::error::{AppError, ErrorKind};
use forum_core::result::AppResult;
use forum_entity::setting::ForumSetting;

use crate::store::SettingStore;

/// Repository for forum-wide settings.
#[derive(Debug, Clone)]
pub struct PgSettingStore {
    pool: PgPool,
}

impl PgSettingStore {
    /// Create a new setting repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct SettingRow {
    key: String,
    value: String,
    updated_at: DateTime<Utc>,
}

impl From<SettingRow> for ForumSetting {
    fn from(row: SettingRow) -> Self {
        Self {
            key: row.key,
            value: row.value,
            updated_at: row.updated_at,
        }
    }
}

#[async_trait]
impl SettingStore for PgSettingStore {
    async fn find_by_key(&self, key: &str) -> AppResult<Option<ForumSetting>> {
        sqlx::query_as::<_, SettingRow>("SELECT * FROM forum_settings WHERE key = $1")
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map(|row| row.map(ForumSetting::from))
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find setting", e))
    }

    async fn insert_if_absent(&self, setting: &ForumSetting) -> AppResult<bool> {
        // Conflict-free insert: an operator-edited value is never replaced.
        let result = sqlx::query(
            "INSERT INTO forum_settings (key, value, updated_at) VALUES ($1, $2, $3) \
             ON CONFLICT (key) DO NOTHING",
        )
        .bind(&setting.key)
        .bind(&setting.value)
        .bind(setting.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to insert setting", e))?;

        Ok(result.rows_affected() > 0)
    }

    async fn count_all(&self) -> AppResult<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM forum_settings")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to count settings", e)
            })?;
        Ok(count as u64)
    }
}
