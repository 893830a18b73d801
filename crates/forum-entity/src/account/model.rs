//! Account entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use forum_core::types::UserId;

use super::role::{Role, RoleSet};

/// A registered forum account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    /// Unique account identifier.
    pub id: UserId,
    /// Unique login name.
    pub username: String,
    /// Role membership.
    pub roles: RoleSet,
    /// When the account's paid patronage lapses, if it ever had one.
    pub premium_expiry: Option<DateTime<Utc>>,
    /// Rewrite marker, incremented by the store on every persisted write.
    pub revision: i64,
    /// When the account was created.
    pub created_at: DateTime<Utc>,
    /// When the account was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Account {
    /// Create a fresh account with no roles and no patronage.
    pub fn new(username: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            id: UserId::new(),
            username: username.into(),
            roles: RoleSet::new(),
            premium_expiry: None,
            revision: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether the patronage has lapsed as of `now`.
    pub fn premium_lapsed(&self, now: DateTime<Utc>) -> bool {
        matches!(self.premium_expiry, Some(expiry) if expiry < now)
    }

    /// Apply the membership-tier downgrade for a lapsed patronage.
    ///
    /// Removes `patron` and grants `vip`. Returns `true` only if the role
    /// set actually changed; an already-reconciled account is left exactly
    /// as it was so callers can skip the persisted rewrite. The transition
    /// is monotonic: nothing here ever re-grants `patron`.
    pub fn reconcile_lapsed_premium(&mut self) -> bool {
        let removed = self.roles.remove(Role::Patron);
        let added = self.roles.insert(Role::Vip);
        removed || added
    }
}
