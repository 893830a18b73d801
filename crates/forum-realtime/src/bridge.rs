//! Binds real-time handshakes to HTTP session identity.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, info};

use forum_auth::SessionService;
use forum_core::types::Identity;

use crate::connection::{ConnectionHandle, ConnectionId, ConnectionPhase, ConnectionRegistry};
use crate::events::ServerEvent;

/// The credential material extracted from an upgrade request.
#[derive(Debug, Default, Clone)]
pub struct HandshakeRequest {
    /// The session credential, if the request carried one (cookie or query
    /// token — the HTTP layer extracts it with the same helper it uses for
    /// ordinary requests).
    pub credential: Option<String>,
}

/// Intercepts every connection attempt and attaches the caller's identity
/// before any event handler runs.
///
/// Resolution goes through the identical [`SessionService`] the HTTP session
/// middleware uses, so a socket opened from an authenticated browser tab
/// inherits that tab's identity with no separate login. A failed resolution
/// tags the connection anonymous instead of refusing the handshake.
pub struct SessionBridge {
    sessions: SessionService,
    registry: Arc<ConnectionRegistry>,
    buffer_size: usize,
}

impl std::fmt::Debug for SessionBridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionBridge").finish()
    }
}

impl SessionBridge {
    /// Create a bridge over the shared session service and registry.
    pub fn new(
        sessions: SessionService,
        registry: Arc<ConnectionRegistry>,
        buffer_size: usize,
    ) -> Self {
        Self {
            sessions,
            registry,
            buffer_size,
        }
    }

    /// Accept a connection attempt.
    ///
    /// Resolves the identity, registers the connection, and returns the
    /// handle plus the receiver half of its outbound queue. Registration
    /// happens before this function returns, so no broadcast can miss the
    /// connection once the caller starts its handler loop.
    pub async fn connect(
        &self,
        handshake: HandshakeRequest,
    ) -> (Arc<ConnectionHandle>, mpsc::Receiver<String>) {
        let identity = self.sessions.resolve(handshake.credential.as_deref()).await;

        let (tx, rx) = mpsc::channel(self.buffer_size);
        let handle = Arc::new(ConnectionHandle::new(identity, tx));
        handle.advance(match identity {
            Identity::User(_) => ConnectionPhase::Authenticated,
            Identity::Anonymous => ConnectionPhase::Anonymous,
        });

        self.registry.register(Arc::clone(&handle));
        handle.send_event(&ServerEvent::Welcome { identity });

        info!(
            conn_id = %handle.id,
            identity = %identity,
            "Real-time connection registered"
        );

        (handle, rx)
    }

    /// Mark the connection handler loop as running.
    pub fn activate(&self, handle: &ConnectionHandle) {
        handle.advance(ConnectionPhase::Active);
    }

    /// Tear down a connection.
    ///
    /// Called exactly once per connection on every teardown path, including
    /// abnormal drops; a repeat call is a no-op.
    pub fn disconnect(&self, conn_id: &ConnectionId) {
        if let Some(handle) = self.registry.unregister(conn_id) {
            info!(
                conn_id = %conn_id,
                identity = %handle.identity,
                "Real-time connection closed"
            );
        } else {
            debug!(conn_id = %conn_id, "Disconnect for already-removed connection");
        }
    }

    /// The registry this bridge registers into.
    pub fn registry(&self) -> &Arc<ConnectionRegistry> {
        &self.registry
    }
}

#[cfg(test)]
mod tests {
    use forum_core::config::session::SessionConfig;
    use forum_core::types::UserId;
    use forum_database::memory::MemoryForumStore;

    use super::*;

    fn bridge(store: Arc<MemoryForumStore>) -> (SessionBridge, SessionService) {
        let sessions = SessionService::new(store, "test-signing-key", SessionConfig::default());
        let registry = Arc::new(ConnectionRegistry::new());
        (
            SessionBridge::new(sessions.clone(), registry, 8),
            sessions,
        )
    }

    #[tokio::test]
    async fn test_valid_credential_binds_the_http_identity() {
        let store = Arc::new(MemoryForumStore::new());
        let (bridge, sessions) = bridge(store);

        let user = UserId::new();
        let (_, token) = sessions.issue(Some(user)).await.unwrap();

        let (handle, mut rx) = bridge
            .connect(HandshakeRequest {
                credential: Some(token),
            })
            .await;

        assert_eq!(handle.identity, Identity::User(user));
        assert_eq!(handle.phase(), ConnectionPhase::Authenticated);
        assert_eq!(
            bridge
                .registry()
                .list_by_identity(&Identity::User(user))
                .len(),
            1
        );

        // The welcome event is queued before any handler runs.
        let welcome: ServerEvent = serde_json::from_str(&rx.try_recv().unwrap()).unwrap();
        assert_eq!(
            welcome,
            ServerEvent::Welcome {
                identity: Identity::User(user)
            }
        );
    }

    #[tokio::test]
    async fn test_missing_credential_is_accepted_as_anonymous() {
        let store = Arc::new(MemoryForumStore::new());
        let (bridge, _) = bridge(store);

        let (handle, _rx) = bridge.connect(HandshakeRequest::default()).await;
        assert_eq!(handle.identity, Identity::Anonymous);
        assert_eq!(handle.phase(), ConnectionPhase::Anonymous);
        assert!(bridge.registry().is_connected(&Identity::Anonymous));
    }

    #[tokio::test]
    async fn test_invalid_credential_degrades_to_anonymous() {
        let store = Arc::new(MemoryForumStore::new());
        let (bridge, _) = bridge(store);

        let (handle, _rx) = bridge
            .connect(HandshakeRequest {
                credential: Some("tampered".to_string()),
            })
            .await;
        assert_eq!(handle.identity, Identity::Anonymous);
    }

    #[tokio::test]
    async fn test_disconnect_is_idempotent() {
        let store = Arc::new(MemoryForumStore::new());
        let (bridge, _) = bridge(store);

        let (handle, _rx) = bridge.connect(HandshakeRequest::default()).await;
        bridge.activate(&handle);
        bridge.disconnect(&handle.id);
        bridge.disconnect(&handle.id);
        assert_eq!(bridge.registry().connection_count(), 0);
    }
}
