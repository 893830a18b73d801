//! The periodic maintenance sweep.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

use forum_core::config::retention::RetentionConfig;
use forum_database::{AccountStore, EphemeralStore, SessionStore};
use forum_entity::ephemeral::EphemeralKind;

/// Outcome of pruning one ephemeral record kind.
#[derive(Debug, Clone, Serialize)]
pub struct KindSweep {
    /// The record kind.
    pub kind: EphemeralKind,
    /// Records removed.
    pub removed: u64,
}

/// A failure inside one sweep step.
///
/// A failed step never aborts the rest of the sweep; failures are carried
/// here and the next scheduled sweep retries naturally.
#[derive(Debug, Clone, Serialize)]
pub struct SweepError {
    /// The step that failed (`retention:<kind>`, `sessions`,
    /// `membership:<username>`, ...).
    pub stage: String,
    /// The underlying error message.
    pub detail: String,
}

/// Report of one sweep invocation.
#[derive(Debug, Clone, Serialize)]
pub struct SweepReport {
    /// When the sweep started.
    pub started_at: DateTime<Utc>,
    /// When the sweep finished.
    pub finished_at: DateTime<Utc>,
    /// Expired session rows removed.
    pub expired_sessions_removed: u64,
    /// Per-kind ephemeral record removals.
    pub records_removed: Vec<KindSweep>,
    /// Accounts with a lapsed patronage that were examined.
    pub accounts_examined: u64,
    /// Accounts actually rewritten with the downgraded role set.
    pub accounts_downgraded: u64,
    /// Errors collected along the way.
    pub errors: Vec<SweepError>,
}

impl SweepReport {
    /// Whether every step completed without error.
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Runs one idempotent cleanup/reconciliation pass over the stores.
pub struct MaintenanceSweeper {
    ephemeral: Arc<dyn EphemeralStore>,
    accounts: Arc<dyn AccountStore>,
    sessions: Arc<dyn SessionStore>,
    retention: RetentionConfig,
}

impl std::fmt::Debug for MaintenanceSweeper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MaintenanceSweeper")
            .field("retention", &self.retention)
            .finish()
    }
}

impl MaintenanceSweeper {
    /// Create a sweeper over the given stores.
    pub fn new(
        ephemeral: Arc<dyn EphemeralStore>,
        accounts: Arc<dyn AccountStore>,
        sessions: Arc<dyn SessionStore>,
        retention: RetentionConfig,
    ) -> Self {
        Self {
            ephemeral,
            accounts,
            sessions,
            retention,
        }
    }

    /// Run one sweep as of the current instant.
    pub async fn sweep(&self) -> SweepReport {
        self.sweep_at(Utc::now()).await
    }

    /// Run one sweep with an explicit notion of "now".
    ///
    /// Every step is independently idempotent and safe to overlap with a
    /// concurrent sweep or with normal writes: deletions compare on a stored
    /// timestamp, and the role rewrite only persists when the set actually
    /// changed.
    pub async fn sweep_at(&self, now: DateTime<Utc>) -> SweepReport {
        let started_at = now;
        let mut report = SweepReport {
            started_at,
            finished_at: started_at,
            expired_sessions_removed: 0,
            records_removed: Vec::new(),
            accounts_examined: 0,
            accounts_downgraded: 0,
            errors: Vec::new(),
        };

        self.prune_ephemeral(now, &mut report).await;
        self.prune_sessions(now, &mut report).await;
        self.reconcile_memberships(now, &mut report).await;

        report.finished_at = Utc::now();

        if report.is_clean() {
            info!(
                sessions = report.expired_sessions_removed,
                downgraded = report.accounts_downgraded,
                "Maintenance sweep completed"
            );
        } else {
            warn!(
                errors = report.errors.len(),
                "Maintenance sweep completed with errors"
            );
        }

        report
    }

    /// Delete each ephemeral kind past its retention window, one bulk
    /// predicate per kind.
    async fn prune_ephemeral(&self, now: DateTime<Utc>, report: &mut SweepReport) {
        for kind in EphemeralKind::ALL {
            let cutoff = now - kind.retention_window(&self.retention);
            match self.ephemeral.delete_older_than(kind, cutoff).await {
                Ok(removed) => {
                    if removed > 0 {
                        info!(kind = %kind, removed, "Pruned expired records");
                    }
                    report.records_removed.push(KindSweep { kind, removed });
                }
                Err(e) => {
                    warn!(kind = %kind, error = %e, "Failed to prune records");
                    report.errors.push(SweepError {
                        stage: format!("retention:{kind}"),
                        detail: e.to_string(),
                    });
                }
            }
        }
    }

    /// Remove session rows whose expiry has passed.
    async fn prune_sessions(&self, now: DateTime<Utc>, report: &mut SweepReport) {
        match self.sessions.delete_expired(now).await {
            Ok(removed) => {
                if removed > 0 {
                    info!(removed, "Pruned expired sessions");
                }
                report.expired_sessions_removed = removed;
            }
            Err(e) => {
                warn!(error = %e, "Failed to prune sessions");
                report.errors.push(SweepError {
                    stage: "sessions".to_string(),
                    detail: e.to_string(),
                });
            }
        }
    }

    /// Downgrade lapsed patronages: remove `patron`, grant `vip`.
    ///
    /// Read-then-conditional-write per account. An account that is already
    /// in the target state is left untouched — no rewrite, no revision bump.
    /// The transition is monotonic; nothing here re-grants `patron`.
    async fn reconcile_memberships(&self, now: DateTime<Utc>, report: &mut SweepReport) {
        let lapsed = match self.accounts.find_premium_expired(now).await {
            Ok(accounts) => accounts,
            Err(e) => {
                warn!(error = %e, "Failed to query lapsed patronages");
                report.errors.push(SweepError {
                    stage: "membership".to_string(),
                    detail: e.to_string(),
                });
                return;
            }
        };

        report.accounts_examined = lapsed.len() as u64;

        for mut account in lapsed {
            if !account.reconcile_lapsed_premium() {
                continue;
            }
            match self.accounts.save(&account).await {
                Ok(_) => {
                    info!(username = %account.username, "Patronage lapsed, downgraded to vip");
                    report.accounts_downgraded += 1;
                }
                Err(e) => {
                    warn!(username = %account.username, error = %e, "Failed to downgrade account");
                    report.errors.push(SweepError {
                        stage: format!("membership:{}", account.username),
                        detail: e.to_string(),
                    });
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use chrono::{Duration, TimeZone};
    use forum_core::result::AppResult;
    use forum_database::memory::MemoryForumStore;
    use forum_entity::account::{Account, Role};
    use forum_entity::ephemeral::EphemeralRecord;

    use super::*;

    fn sweeper(store: Arc<MemoryForumStore>) -> MaintenanceSweeper {
        MaintenanceSweeper::new(
            Arc::clone(&store) as Arc<dyn EphemeralStore>,
            Arc::clone(&store) as Arc<dyn AccountStore>,
            store as Arc<dyn SessionStore>,
            RetentionConfig::default(),
        )
    }

    #[tokio::test]
    async fn test_retention_deletes_only_past_window_records() {
        let store = Arc::new(MemoryForumStore::new());
        let now = Utc::now();
        let retention = RetentionConfig::default();

        let window = EphemeralKind::PresencePing.retention_window(&retention);
        let stale = EphemeralRecord::new(
            EphemeralKind::PresencePing,
            serde_json::json!({"user": "alice"}),
            now - window - Duration::minutes(1),
        );
        let fresh = EphemeralRecord::new(
            EphemeralKind::PresencePing,
            serde_json::json!({"user": "bob"}),
            now - Duration::minutes(1),
        );
        EphemeralStore::insert(store.as_ref(), &stale).await.unwrap();
        EphemeralStore::insert(store.as_ref(), &fresh).await.unwrap();

        let report = sweeper(Arc::clone(&store)).sweep_at(now).await;
        assert!(report.is_clean());

        let survivors = store.find_by_kind(EphemeralKind::PresencePing).await.unwrap();
        assert_eq!(survivors.len(), 1);
        assert_eq!(survivors[0].id, fresh.id);

        // No surviving record is older than the window after the sweep.
        let cutoff = now - window;
        assert!(survivors.iter().all(|r| !r.is_older_than(cutoff)));
    }

    #[tokio::test]
    async fn test_lapsed_patron_is_downgraded_exactly_once() {
        let store = Arc::new(MemoryForumStore::new());
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();

        let mut alice = Account::new("alice", now - Duration::days(1500));
        alice.roles.insert(Role::Patron);
        alice.premium_expiry = Some(Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap());
        AccountStore::insert(store.as_ref(), &alice).await.unwrap();

        let sweeper = sweeper(Arc::clone(&store));

        let report = sweeper.sweep_at(now).await;
        assert_eq!(report.accounts_downgraded, 1);

        let stored = AccountStore::find_by_id(store.as_ref(), alice.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.roles.to_vec(), vec!["vip".to_string()]);
        assert_eq!(stored.revision, 1);

        // Second sweep: same result, and the rewrite marker is untouched.
        let report = sweeper.sweep_at(now).await;
        assert_eq!(report.accounts_examined, 1);
        assert_eq!(report.accounts_downgraded, 0);

        let stored = AccountStore::find_by_id(store.as_ref(), alice.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.roles.to_vec(), vec!["vip".to_string()]);
        assert_eq!(stored.revision, 1);
    }

    #[tokio::test]
    async fn test_active_patron_is_untouched() {
        let store = Arc::new(MemoryForumStore::new());
        let now = Utc::now();

        let mut bob = Account::new("bob", now);
        bob.roles.insert(Role::Patron);
        bob.premium_expiry = Some(now + Duration::days(30));
        AccountStore::insert(store.as_ref(), &bob).await.unwrap();

        sweeper(Arc::clone(&store)).sweep_at(now).await;

        let stored = AccountStore::find_by_id(store.as_ref(), bob.id)
            .await
            .unwrap()
            .unwrap();
        assert!(stored.roles.contains(Role::Patron));
        assert!(!stored.roles.contains(Role::Vip));
        assert_eq!(stored.revision, 0);
    }

    /// Ephemeral store double whose presence-ping deletes always fail.
    struct FailingPings {
        inner: Arc<MemoryForumStore>,
    }

    #[async_trait]
    impl EphemeralStore for FailingPings {
        async fn insert(&self, record: &EphemeralRecord) -> AppResult<()> {
            EphemeralStore::insert(self.inner.as_ref(), record).await
        }

        async fn delete_older_than(
            &self,
            kind: EphemeralKind,
            cutoff: DateTime<Utc>,
        ) -> AppResult<u64> {
            if kind == EphemeralKind::PresencePing {
                return Err(forum_core::AppError::database("connection reset"));
            }
            self.inner.delete_older_than(kind, cutoff).await
        }

        async fn count_by_kind(&self, kind: EphemeralKind) -> AppResult<u64> {
            self.inner.count_by_kind(kind).await
        }

        async fn find_by_kind(&self, kind: EphemeralKind) -> AppResult<Vec<EphemeralRecord>> {
            self.inner.find_by_kind(kind).await
        }
    }

    #[tokio::test]
    async fn test_one_failing_kind_does_not_abort_the_rest() {
        let store = Arc::new(MemoryForumStore::new());
        let now = Utc::now();
        let retention = RetentionConfig::default();

        let stale_audit = EphemeralRecord::new(
            EphemeralKind::AuditEntry,
            serde_json::json!({}),
            now - EphemeralKind::AuditEntry.retention_window(&retention) - Duration::days(1),
        );
        EphemeralStore::insert(store.as_ref(), &stale_audit)
            .await
            .unwrap();

        let mut carol = Account::new("carol", now - Duration::days(800));
        carol.roles.insert(Role::Patron);
        carol.premium_expiry = Some(now - Duration::days(10));
        AccountStore::insert(store.as_ref(), &carol).await.unwrap();

        let sweeper = MaintenanceSweeper::new(
            Arc::new(FailingPings {
                inner: Arc::clone(&store),
            }),
            Arc::clone(&store) as Arc<dyn AccountStore>,
            Arc::clone(&store) as Arc<dyn SessionStore>,
            retention,
        );

        let report = sweeper.sweep_at(now).await;

        // The failing kind is reported...
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].stage, "retention:presence_ping");
        // ...while the other kinds and the membership pass still ran.
        assert_eq!(
            store.count_by_kind(EphemeralKind::AuditEntry).await.unwrap(),
            0
        );
        assert_eq!(report.accounts_downgraded, 1);
    }
}
