//! In-memory implementation of the store traits.
//!
//! Backs hermetic tests with the same seam the PostgreSQL repositories
//! implement, so components under test see identical persistence semantics
//! (conflict-free inserts, revision bumps, bulk timestamp predicates).

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;

use forum_core::error::AppError;
use forum_core::result::AppResult;
use forum_core::types::{RecordId, SessionId, UserId};
use forum_entity::account::Account;
use forum_entity::ephemeral::{EphemeralKind, EphemeralRecord};
use forum_entity::session::SessionRecord;
use forum_entity::setting::ForumSetting;

use crate::store::{AccountStore, EphemeralStore, SessionStore, SettingStore};

/// A complete in-memory document store.
#[derive(Debug, Default)]
pub struct MemoryForumStore {
    accounts: DashMap<UserId, Account>,
    settings: DashMap<String, ForumSetting>,
    sessions: DashMap<SessionId, SessionRecord>,
    ephemeral: DashMap<RecordId, EphemeralRecord>,
}

impl MemoryForumStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AccountStore for MemoryForumStore {
    async fn find_by_id(&self, id: UserId) -> AppResult<Option<Account>> {
        Ok(self.accounts.get(&id).map(|entry| entry.value().clone()))
    }

    async fn find_by_username(&self, username: &str) -> AppResult<Option<Account>> {
        Ok(self
            .accounts
            .iter()
            .find(|entry| entry.value().username == username)
            .map(|entry| entry.value().clone()))
    }

    async fn find_premium_expired(&self, now: DateTime<Utc>) -> AppResult<Vec<Account>> {
        let mut expired: Vec<Account> = self
            .accounts
            .iter()
            .filter(|entry| entry.value().premium_lapsed(now))
            .map(|entry| entry.value().clone())
            .collect();
        expired.sort_by_key(|a| a.premium_expiry);
        Ok(expired)
    }

    async fn count_all(&self) -> AppResult<u64> {
        Ok(self.accounts.len() as u64)
    }

    async fn insert(&self, account: &Account) -> AppResult<()> {
        if self.accounts.contains_key(&account.id) {
            return Err(AppError::conflict(format!(
                "Account {} already exists",
                account.id
            )));
        }
        self.accounts.insert(account.id, account.clone());
        Ok(())
    }

    async fn save(&self, account: &Account) -> AppResult<Account> {
        let mut entry = self
            .accounts
            .get_mut(&account.id)
            .ok_or_else(|| AppError::not_found(format!("Account {} not found", account.id)))?;

        let stored = entry.value_mut();
        stored.roles = account.roles.clone();
        stored.premium_expiry = account.premium_expiry;
        stored.revision += 1;
        stored.updated_at = Utc::now();
        Ok(stored.clone())
    }
}

#[async_trait]
impl SettingStore for MemoryForumStore {
    async fn find_by_key(&self, key: &str) -> AppResult<Option<ForumSetting>> {
        Ok(self.settings.get(key).map(|entry| entry.value().clone()))
    }

    async fn insert_if_absent(&self, setting: &ForumSetting) -> AppResult<bool> {
        match self.settings.entry(setting.key.clone()) {
            dashmap::mapref::entry::Entry::Occupied(_) => Ok(false),
            dashmap::mapref::entry::Entry::Vacant(vacant) => {
                vacant.insert(setting.clone());
                Ok(true)
            }
        }
    }

    async fn count_all(&self) -> AppResult<u64> {
        Ok(self.settings.len() as u64)
    }
}

#[async_trait]
impl SessionStore for MemoryForumStore {
    async fn insert(&self, session: &SessionRecord) -> AppResult<()> {
        self.sessions.insert(session.id, session.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: SessionId) -> AppResult<Option<SessionRecord>> {
        Ok(self.sessions.get(&id).map(|entry| entry.value().clone()))
    }

    async fn save(&self, session: &SessionRecord) -> AppResult<()> {
        self.sessions.insert(session.id, session.clone());
        Ok(())
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> AppResult<u64> {
        let before = self.sessions.len();
        self.sessions.retain(|_, session| !session.is_expired(now));
        Ok((before - self.sessions.len()) as u64)
    }
}

#[async_trait]
impl EphemeralStore for MemoryForumStore {
    async fn insert(&self, record: &EphemeralRecord) -> AppResult<()> {
        self.ephemeral.insert(record.id, record.clone());
        Ok(())
    }

    async fn delete_older_than(
        &self,
        kind: EphemeralKind,
        cutoff: DateTime<Utc>,
    ) -> AppResult<u64> {
        let before = self.ephemeral.len();
        self.ephemeral
            .retain(|_, record| record.kind != kind || !record.is_older_than(cutoff));
        Ok((before - self.ephemeral.len()) as u64)
    }

    async fn count_by_kind(&self, kind: EphemeralKind) -> AppResult<u64> {
        Ok(self
            .ephemeral
            .iter()
            .filter(|entry| entry.value().kind == kind)
            .count() as u64)
    }

    async fn find_by_kind(&self, kind: EphemeralKind) -> AppResult<Vec<EphemeralRecord>> {
        let mut records: Vec<EphemeralRecord> = self
            .ephemeral
            .iter()
            .filter(|entry| entry.value().kind == kind)
            .map(|entry| entry.value().clone())
            .collect();
        records.sort_by_key(|r| r.created_at);
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    #[tokio::test]
    async fn test_insert_if_absent_never_overwrites() {
        let store = MemoryForumStore::new();
        let now = Utc::now();

        let original = ForumSetting::new("forum_name", "Powrum", now);
        assert!(store.insert_if_absent(&original).await.unwrap());

        let replacement = ForumSetting::new("forum_name", "Other", now);
        assert!(!store.insert_if_absent(&replacement).await.unwrap());

        let stored = store.find_by_key("forum_name").await.unwrap().unwrap();
        assert_eq!(stored.value, "Powrum");
        assert_eq!(SettingStore::count_all(&store).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_save_bumps_revision() {
        let store = MemoryForumStore::new();
        let account = Account::new("alice", Utc::now());
        AccountStore::insert(&store, &account).await.unwrap();

        let saved = AccountStore::save(&store, &account).await.unwrap();
        assert_eq!(saved.revision, 1);
        let saved = AccountStore::save(&store, &saved).await.unwrap();
        assert_eq!(saved.revision, 2);
    }

    #[tokio::test]
    async fn test_delete_older_than_respects_kind_and_cutoff() {
        let store = MemoryForumStore::new();
        let now = Utc::now();

        let old_ping = EphemeralRecord::new(
            EphemeralKind::PresencePing,
            serde_json::json!({}),
            now - Duration::hours(2),
        );
        let young_ping =
            EphemeralRecord::new(EphemeralKind::PresencePing, serde_json::json!({}), now);
        let old_audit = EphemeralRecord::new(
            EphemeralKind::AuditEntry,
            serde_json::json!({}),
            now - Duration::hours(2),
        );
        for record in [&old_ping, &young_ping, &old_audit] {
            EphemeralStore::insert(&store, record).await.unwrap();
        }

        let deleted = store
            .delete_older_than(EphemeralKind::PresencePing, now - Duration::hours(1))
            .await
            .unwrap();
        assert_eq!(deleted, 1);
        assert_eq!(
            store.count_by_kind(EphemeralKind::PresencePing).await.unwrap(),
            1
        );
        assert_eq!(
            store.count_by_kind(EphemeralKind::AuditEntry).await.unwrap(),
            1
        );
    }
}
