//! Session issuance and resolution.

use std::sync::Arc;

use chrono::{Duration, Utc};
use tracing::{debug, warn};

use forum_core::config::session::SessionConfig;
use forum_core::result::AppResult;
use forum_core::types::{Identity, UserId};
use forum_database::SessionStore;
use forum_entity::session::SessionRecord;

use super::token::SessionTokenCodec;

/// The single session-resolution path for the whole server.
///
/// HTTP requests and real-time handshakes hand their credential to
/// [`resolve`](Self::resolve); both therefore see identical identities for
/// the same browser tab.
#[derive(Clone)]
pub struct SessionService {
    store: Arc<dyn SessionStore>,
    codec: SessionTokenCodec,
    config: SessionConfig,
}

impl std::fmt::Debug for SessionService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionService")
            .field("config", &self.config)
            .finish()
    }
}

impl SessionService {
    /// Create the service over a session store.
    pub fn new(store: Arc<dyn SessionStore>, signing_key: &str, config: SessionConfig) -> Self {
        Self {
            store,
            codec: SessionTokenCodec::new(signing_key),
            config,
        }
    }

    /// Name of the cookie the credential travels in.
    pub fn cookie_name(&self) -> &str {
        &self.config.cookie_name
    }

    /// Create a session and return its record plus the signed credential.
    pub async fn issue(&self, user_id: Option<UserId>) -> AppResult<(SessionRecord, String)> {
        let session = SessionRecord::new(
            user_id,
            Utc::now(),
            self.rolling_window(),
            Duration::days(self.config.max_lifetime_days as i64),
        );
        self.store.insert(&session).await?;
        let token = self.codec.encode(&session)?;
        Ok((session, token))
    }

    /// Resolve a credential to an identity.
    ///
    /// Never fails: a missing, malformed, expired, or unknown credential —
    /// and any store error along the way — resolves to
    /// [`Identity::Anonymous`] so callers degrade instead of refusing.
    pub async fn resolve(&self, credential: Option<&str>) -> Identity {
        let Some(token) = credential else {
            return Identity::Anonymous;
        };

        match self.try_resolve(token).await {
            Ok(identity) => identity,
            Err(e) => {
                debug!(error = %e, "Session resolution failed, downgrading to anonymous");
                Identity::Anonymous
            }
        }
    }

    async fn try_resolve(&self, token: &str) -> AppResult<Identity> {
        let session_id = self.codec.decode(token)?;

        let mut session = self
            .store
            .find_by_id(session_id)
            .await?
            .ok_or_else(|| forum_core::AppError::session("Unknown session"))?;

        let now = Utc::now();
        if session.is_expired(now) {
            return Err(forum_core::AppError::session("Session expired"));
        }

        let identity = session.identity();

        // Rolling expiry: extend on each authenticated access, bounded by
        // the absolute cap. A failed extension does not cost the caller
        // their resolved identity.
        session.touch(now, self.rolling_window());
        if let Err(e) = self.store.save(&session).await {
            warn!(session_id = %session.id, error = %e, "Failed to persist session activity");
        }

        Ok(identity)
    }

    fn rolling_window(&self) -> Duration {
        Duration::hours(self.config.rolling_window_hours as i64)
    }
}
