//! The narrow persistence interface the rest of the application sees.
//!
//! Every operation the core issues against the document store goes through
//! one of these traits. The PostgreSQL repositories and the in-memory store
//! implement the same seam, so components and their tests are backed
//! interchangeably.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use forum_core::result::AppResult;
use forum_core::types::{SessionId, UserId};
use forum_entity::account::Account;
use forum_entity::ephemeral::{EphemeralKind, EphemeralRecord};
use forum_entity::session::SessionRecord;
use forum_entity::setting::ForumSetting;

/// Account persistence operations.
#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Find an account by its primary key.
    async fn find_by_id(&self, id: UserId) -> AppResult<Option<Account>>;

    /// Find an account by username.
    async fn find_by_username(&self, username: &str) -> AppResult<Option<Account>>;

    /// Find accounts whose `premium_expiry` is strictly before `now`.
    ///
    /// Already-reconciled accounts still match; callers decide per account
    /// whether a rewrite is needed.
    async fn find_premium_expired(&self, now: DateTime<Utc>) -> AppResult<Vec<Account>>;

    /// Count all accounts.
    async fn count_all(&self) -> AppResult<u64>;

    /// Insert a new account.
    async fn insert(&self, account: &Account) -> AppResult<()>;

    /// Persist an updated account, bumping its revision marker. Returns the
    /// stored version.
    async fn save(&self, account: &Account) -> AppResult<Account>;
}

/// Forum setting persistence operations.
#[async_trait]
pub trait SettingStore: Send + Sync {
    /// Find a setting by key.
    async fn find_by_key(&self, key: &str) -> AppResult<Option<ForumSetting>>;

    /// Insert a setting only if no document with its key exists.
    ///
    /// Never overwrites an existing value. Returns `true` if the insert
    /// happened.
    async fn insert_if_absent(&self, setting: &ForumSetting) -> AppResult<bool>;

    /// Count all settings.
    async fn count_all(&self) -> AppResult<u64>;
}

/// Session persistence operations.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Insert a new session record.
    async fn insert(&self, session: &SessionRecord) -> AppResult<()>;

    /// Find a session by its opaque identifier.
    async fn find_by_id(&self, id: SessionId) -> AppResult<Option<SessionRecord>>;

    /// Persist a touched session (rolling expiry, last activity).
    async fn save(&self, session: &SessionRecord) -> AppResult<()>;

    /// Delete sessions whose expiry has passed. Returns the number removed.
    async fn delete_expired(&self, now: DateTime<Utc>) -> AppResult<u64>;
}

/// Ephemeral record persistence operations.
#[async_trait]
pub trait EphemeralStore: Send + Sync {
    /// Append a record.
    async fn insert(&self, record: &EphemeralRecord) -> AppResult<()>;

    /// Delete all records of `kind` created strictly before `cutoff`, as a
    /// single bulk predicate. Returns the number removed.
    async fn delete_older_than(
        &self,
        kind: EphemeralKind,
        cutoff: DateTime<Utc>,
    ) -> AppResult<u64>;

    /// Count records of a kind.
    async fn count_by_kind(&self, kind: EphemeralKind) -> AppResult<u64>;

    /// List records of a kind, oldest first.
    async fn find_by_kind(&self, kind: EphemeralKind) -> AppResult<Vec<EphemeralRecord>>;
}
