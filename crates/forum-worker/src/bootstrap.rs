//! First-run bootstrap reconciliation.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info};

use forum_auth::secrets::PushKeys;
use forum_core::result::AppResult;
use forum_database::{AccountStore, SettingStore};
use forum_entity::account::Account;
use forum_entity::setting::ForumSetting;
use forum_realtime::PushGateway;

/// Username of the fallback administrative account created when the account
/// collection is empty. First-account semantics belong to the permission
/// layer; nothing is granted here beyond the row itself.
pub const FALLBACK_ADMIN_USERNAME: &str = "admin";

/// Default settings seeded on first run. Values are only ever inserted when
/// the key is absent; operator edits survive every restart.
pub const DEFAULT_SETTINGS: &[(&str, &str)] = &[
    ("forum_name", "Powrum"),
    ("forum_description", "A community forum"),
    ("registration_open", "true"),
    ("max_post_length", "10000"),
];

/// Ensures default configuration and the fallback account exist, exactly
/// once, after the database connection reports ready.
///
/// Every step is independently idempotent: running `reconcile` twice against
/// the same database produces no duplicate settings and no duplicate
/// fallback account.
pub struct BootstrapReconciler {
    settings: Arc<dyn SettingStore>,
    accounts: Arc<dyn AccountStore>,
    push: Arc<PushGateway>,
    push_keys: PushKeys,
    push_contact: String,
}

impl std::fmt::Debug for BootstrapReconciler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BootstrapReconciler").finish()
    }
}

impl BootstrapReconciler {
    /// Create a reconciler over the given stores and push material.
    pub fn new(
        settings: Arc<dyn SettingStore>,
        accounts: Arc<dyn AccountStore>,
        push: Arc<PushGateway>,
        push_keys: PushKeys,
        push_contact: String,
    ) -> Self {
        Self {
            settings,
            accounts,
            push,
            push_keys,
            push_contact,
        }
    }

    /// Run the bootstrap pass.
    pub async fn reconcile(&self) -> AppResult<()> {
        self.seed_default_settings().await?;
        self.configure_push();
        self.ensure_fallback_account().await?;
        info!("Bootstrap reconciliation complete");
        Ok(())
    }

    /// Insert each missing default setting. Existence-checked inserts only —
    /// never an upsert that could overwrite an operator-edited value.
    async fn seed_default_settings(&self) -> AppResult<()> {
        let now = Utc::now();
        for (key, value) in DEFAULT_SETTINGS {
            let inserted = self
                .settings
                .insert_if_absent(&ForumSetting::new(*key, *value, now))
                .await?;
            if inserted {
                debug!(key, "Seeded default setting");
            }
        }
        Ok(())
    }

    /// Hand the provisioned key pair to the push subsystem. A freshly
    /// generated pair invalidates whatever subscriptions clients held.
    fn configure_push(&self) {
        self.push.configure(
            self.push_keys.public_key.clone(),
            self.push_keys.private_key.clone(),
            self.push_contact.clone(),
        );
        if self.push_keys.freshly_generated {
            info!("Push key pair was generated this startup; prior subscriptions are invalid");
        }
    }

    /// Create the fallback administrative account if no accounts exist.
    async fn ensure_fallback_account(&self) -> AppResult<()> {
        if self.accounts.count_all().await? > 0 {
            return Ok(());
        }

        let account = Account::new(FALLBACK_ADMIN_USERNAME, Utc::now());
        self.accounts.insert(&account).await?;
        info!(username = FALLBACK_ADMIN_USERNAME, "Created fallback administrative account");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use forum_database::memory::MemoryForumStore;

    use super::*;

    fn reconciler(store: Arc<MemoryForumStore>, fresh_keys: bool) -> BootstrapReconciler {
        BootstrapReconciler::new(
            Arc::clone(&store) as Arc<dyn SettingStore>,
            store as Arc<dyn AccountStore>,
            Arc::new(PushGateway::new()),
            PushKeys {
                public_key: "pk".to_string(),
                private_key: "sk".to_string(),
                freshly_generated: fresh_keys,
            },
            "mailto:admin@powrum.example".to_string(),
        )
    }

    #[tokio::test]
    async fn test_reconcile_twice_changes_nothing() {
        let store = Arc::new(MemoryForumStore::new());
        let reconciler = reconciler(Arc::clone(&store), true);

        reconciler.reconcile().await.unwrap();
        let settings_after_first = SettingStore::count_all(store.as_ref()).await.unwrap();
        let accounts_after_first = AccountStore::count_all(store.as_ref()).await.unwrap();
        assert_eq!(settings_after_first, DEFAULT_SETTINGS.len() as u64);
        assert_eq!(accounts_after_first, 1);

        reconciler.reconcile().await.unwrap();
        assert_eq!(
            SettingStore::count_all(store.as_ref()).await.unwrap(),
            settings_after_first
        );
        assert_eq!(
            AccountStore::count_all(store.as_ref()).await.unwrap(),
            accounts_after_first
        );
    }

    #[tokio::test]
    async fn test_operator_edited_setting_survives() {
        let store = Arc::new(MemoryForumStore::new());

        // An operator renamed the forum before a restart.
        let edited = ForumSetting::new("forum_name", "Ada's Place", Utc::now());
        store.insert_if_absent(&edited).await.unwrap();

        reconciler(Arc::clone(&store), false)
            .reconcile()
            .await
            .unwrap();

        let stored = store.find_by_key("forum_name").await.unwrap().unwrap();
        assert_eq!(stored.value, "Ada's Place");
    }

    #[tokio::test]
    async fn test_fallback_account_skipped_when_accounts_exist() {
        let store = Arc::new(MemoryForumStore::new());
        let existing = Account::new("dave", Utc::now());
        AccountStore::insert(store.as_ref(), &existing).await.unwrap();

        reconciler(Arc::clone(&store), false)
            .reconcile()
            .await
            .unwrap();

        assert_eq!(AccountStore::count_all(store.as_ref()).await.unwrap(), 1);
        assert!(
            AccountStore::find_by_username(store.as_ref(), FALLBACK_ADMIN_USERNAME)
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_push_gateway_is_configured() {
        let store = Arc::new(MemoryForumStore::new());
        let gateway = Arc::new(PushGateway::new());
        let reconciler = BootstrapReconciler::new(
            Arc::clone(&store) as Arc<dyn SettingStore>,
            store as Arc<dyn AccountStore>,
            Arc::clone(&gateway),
            PushKeys {
                public_key: "pk".to_string(),
                private_key: "sk".to_string(),
                freshly_generated: true,
            },
            "mailto:admin@powrum.example".to_string(),
        );

        reconciler.reconcile().await.unwrap();
        assert!(gateway.is_configured());
        assert_eq!(gateway.public_key().as_deref(), Some("pk"));
    }
}
