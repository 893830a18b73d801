//! Stored session record.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use forum_core::types::{Identity, SessionId, UserId};

/// A stored session, looked up by the opaque ID carried in the signed
/// session credential.
///
/// Expiry is rolling: each authenticated access pushes `expires_at` forward
/// by the configured window, never past `absolute_expiry`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionRecord {
    /// Unique session identifier.
    pub id: SessionId,
    /// The account this session belongs to, if authenticated.
    pub user_id: Option<UserId>,
    /// When the session was created.
    pub created_at: DateTime<Utc>,
    /// Current rolling expiry.
    pub expires_at: DateTime<Utc>,
    /// Hard cap on the session lifetime, set once at creation.
    pub absolute_expiry: DateTime<Utc>,
    /// Last authenticated access.
    pub last_activity: DateTime<Utc>,
}

impl SessionRecord {
    /// Create a new session with a rolling window and an absolute cap.
    pub fn new(
        user_id: Option<UserId>,
        now: DateTime<Utc>,
        rolling_window: Duration,
        max_lifetime: Duration,
    ) -> Self {
        let absolute_expiry = now + max_lifetime;
        Self {
            id: SessionId::new(),
            user_id,
            created_at: now,
            expires_at: (now + rolling_window).min(absolute_expiry),
            absolute_expiry,
            last_activity: now,
        }
    }

    /// The identity this session resolves to.
    pub fn identity(&self) -> Identity {
        match self.user_id {
            Some(id) => Identity::User(id),
            None => Identity::Anonymous,
        }
    }

    /// Whether the session is expired as of `now`.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now || self.absolute_expiry <= now
    }

    /// Extend the rolling expiry from `now`, bounded by the absolute cap.
    pub fn touch(&mut self, now: DateTime<Utc>, rolling_window: Duration) {
        self.last_activity = now;
        self.expires_at = (now + rolling_window).min(self.absolute_expiry);
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn test_rolling_expiry_is_capped() {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let mut session =
            SessionRecord::new(None, start, Duration::hours(24), Duration::days(365));

        // Touching just before the absolute cap cannot extend past it.
        let late = session.absolute_expiry - Duration::hours(1);
        session.touch(late, Duration::hours(24));
        assert_eq!(session.expires_at, session.absolute_expiry);
        assert!(session.is_expired(session.absolute_expiry));
    }

    #[test]
    fn test_identity_resolution() {
        let now = Utc::now();
        let user = UserId::new();
        let authed =
            SessionRecord::new(Some(user), now, Duration::hours(24), Duration::days(365));
        assert_eq!(authed.identity(), Identity::User(user));

        let anon = SessionRecord::new(None, now, Duration::hours(24), Duration::days(365));
        assert!(anon.identity().is_anonymous());
    }
}
