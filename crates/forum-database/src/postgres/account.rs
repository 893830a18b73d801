//! Account repository implementation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use forum_core::error::{AppError, ErrorKind};
use forum_core::result::AppResult;
use forum_core::types::UserId;
use forum_entity::account::{Account, RoleSet};

use crate::store::AccountStore;

/// Repository for account persistence and premium-expiry queries.
#[derive(Debug, Clone)]
pub struct PgAccountStore {
    pool: PgPool,
}

impl PgAccountStore {
    /// Create a new account repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Raw row shape; `roles` is a `TEXT[]` column.
#[derive(Debug, sqlx::FromRow)]
struct AccountRow {
    id: Uuid,
    username: String,
    roles: Vec<String>,
    premium_expiry: Option<DateTime<Utc>>,
    revision: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<AccountRow> for Account {
    fn from(row: AccountRow) -> Self {
        Self {
            id: UserId::from_uuid(row.id),
            username: row.username,
            roles: RoleSet::from(row.roles),
            premium_expiry: row.premium_expiry,
            revision: row.revision,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[async_trait]
impl AccountStore for PgAccountStore {
    async fn find_by_id(&self, id: UserId) -> AppResult<Option<Account>> {
        sqlx::query_as::<_, AccountRow>("SELECT * FROM accounts WHERE id = $1")
            .bind(id.into_uuid())
            .fetch_optional(&self.pool)
            .await
            .map(|row| row.map(Account::from))
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find account", e))
    }

    async fn find_by_username(&self, username: &str) -> AppResult<Option<Account>> {
        sqlx::query_as::<_, AccountRow>("SELECT * FROM accounts WHERE username = $1")
            .bind(username)
            .fetch_optional(&self.pool)
            .await
            .map(|row| row.map(Account::from))
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to find account by name", e)
            })
    }

    async fn find_premium_expired(&self, now: DateTime<Utc>) -> AppResult<Vec<Account>> {
        sqlx::query_as::<_, AccountRow>(
            "SELECT * FROM accounts WHERE premium_expiry IS NOT NULL AND premium_expiry < $1 \
             ORDER BY premium_expiry ASC",
        )
        .bind(now)
        .fetch_all(&self.pool)
        .await
        .map(|rows| rows.into_iter().map(Account::from).collect())
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to find expired patronages", e)
        })
    }

    async fn count_all(&self) -> AppResult<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM accounts")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to count accounts", e)
            })?;
        Ok(count as u64)
    }

    async fn insert(&self, account: &Account) -> AppResult<()> {
        sqlx::query(
            "INSERT INTO accounts (id, username, roles, premium_expiry, revision, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(account.id.into_uuid())
        .bind(&account.username)
        .bind(account.roles.to_vec())
        .bind(account.premium_expiry)
        .bind(account.revision)
        .bind(account.created_at)
        .bind(account.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to insert account", e))?;
        Ok(())
    }

    async fn save(&self, account: &Account) -> AppResult<Account> {
        let row = sqlx::query_as::<_, AccountRow>(
            "UPDATE accounts SET roles = $2, premium_expiry = $3, revision = revision + 1, \
             updated_at = $4 WHERE id = $1 RETURNING *",
        )
        .bind(account.id.into_uuid())
        .bind(account.roles.to_vec())
        .bind(account.premium_expiry)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to save account", e))?
        .ok_or_else(|| AppError::not_found(format!("Account {} not found", account.id)))?;

        Ok(Account::from(row))
    }
}
