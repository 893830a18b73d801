//! Process-wide index of live connections, keyed by resolved identity.

use std::sync::Arc;

use dashmap::DashMap;
use tracing::info;

use forum_core::types::Identity;

use crate::events::ServerEvent;

use super::handle::{ConnectionHandle, ConnectionId, ConnectionPhase};

/// Tracks every live real-time connection.
///
/// One instance exists per process, created at startup and injected into
/// every collaborator that needs presence queries or broadcast. All
/// mutations are synchronous with respect to the event that triggered them:
/// a connection is registered before its handler loop starts and
/// unregistered before its disconnect handling completes, so a broadcast
/// never misses or double-reaches a connection.
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    /// Identity → connections in connect order. Anonymous connections all
    /// share the anonymous bucket.
    by_identity: DashMap<Identity, Vec<Arc<ConnectionHandle>>>,
    /// Connection ID → handle for direct lookup.
    by_id: DashMap<ConnectionId, Arc<ConnectionHandle>>,
}

impl ConnectionRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a connection under its identity.
    pub fn register(&self, handle: Arc<ConnectionHandle>) {
        self.by_id.insert(handle.id, Arc::clone(&handle));
        self.by_identity
            .entry(handle.identity)
            .or_default()
            .push(handle);
    }

    /// Remove a connection.
    ///
    /// Exactly-once semantics are the caller's contract, but an entry that
    /// was already removed (double-unregister after an abnormal teardown
    /// racing a close frame) is a no-op rather than an error.
    pub fn unregister(&self, conn_id: &ConnectionId) -> Option<Arc<ConnectionHandle>> {
        let (_, handle) = self.by_id.remove(conn_id)?;

        if let Some(mut connections) = self.by_identity.get_mut(&handle.identity) {
            connections.retain(|c| c.id != *conn_id);
            if connections.is_empty() {
                drop(connections);
                self.by_identity.remove(&handle.identity);
            }
        }

        handle.advance(ConnectionPhase::Disconnected);
        Some(handle)
    }

    /// All connections for an identity, ordered by connect time.
    pub fn list_by_identity(&self, identity: &Identity) -> Vec<Arc<ConnectionHandle>> {
        self.by_identity
            .get(identity)
            .map(|entry| entry.value().clone())
            .unwrap_or_default()
    }

    /// Look up a single connection.
    pub fn get(&self, conn_id: &ConnectionId) -> Option<Arc<ConnectionHandle>> {
        self.by_id.get(conn_id).map(|entry| Arc::clone(entry.value()))
    }

    /// Deliver an event to every live connection for an identity.
    ///
    /// Zero current connections is a successful no-op. Returns the number of
    /// connections the event was queued for.
    pub fn broadcast_to(&self, identity: &Identity, event: &ServerEvent) -> usize {
        let connections = self.list_by_identity(identity);
        if connections.is_empty() {
            return 0;
        }

        let serialized = match serde_json::to_string(event) {
            Ok(s) => s,
            Err(e) => {
                tracing::error!(error = %e, "Failed to serialize broadcast event");
                return 0;
            }
        };

        connections
            .iter()
            .filter(|conn| conn.send(serialized.clone()))
            .count()
    }

    /// Deliver an event to every live connection.
    pub fn broadcast_all(&self, event: &ServerEvent) -> usize {
        let serialized = match serde_json::to_string(event) {
            Ok(s) => s,
            Err(e) => {
                tracing::error!(error = %e, "Failed to serialize broadcast event");
                return 0;
            }
        };

        self.by_id
            .iter()
            .filter(|entry| entry.value().send(serialized.clone()))
            .count()
    }

    /// Whether an identity currently has at least one live connection.
    pub fn is_connected(&self, identity: &Identity) -> bool {
        !self.list_by_identity(identity).is_empty()
    }

    /// Total live connections.
    pub fn connection_count(&self) -> usize {
        self.by_id.len()
    }

    /// Distinct identities with at least one connection (the anonymous
    /// bucket counts once).
    pub fn identity_count(&self) -> usize {
        self.by_identity.len()
    }

    /// Tear down every connection, for process shutdown.
    pub fn close_all(&self) {
        let count = self.by_id.len();
        let ids: Vec<ConnectionId> = self.by_id.iter().map(|entry| *entry.key()).collect();
        for id in ids {
            self.unregister(&id);
        }
        info!(count, "All real-time connections closed");
    }
}
