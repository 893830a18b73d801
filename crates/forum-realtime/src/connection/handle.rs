//! Individual real-time connection handle.

use std::sync::atomic::{AtomicU8, Ordering};

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use uuid::Uuid;

use forum_core::types::Identity;

use crate::events::ServerEvent;

/// Unique connection identifier.
pub type ConnectionId = Uuid;

/// Lifecycle of a real-time connection.
///
/// `Connecting → {Authenticated | Anonymous} → Active → Disconnected`;
/// there is no transition out of `Disconnected`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ConnectionPhase {
    /// Handshake received, identity not yet attached.
    Connecting = 0,
    /// Identity resolved to an account.
    Authenticated = 1,
    /// Identity resolution failed or no credential; tagged anonymous.
    Anonymous = 2,
    /// Event handlers are running.
    Active = 3,
    /// Torn down. Terminal.
    Disconnected = 4,
}

impl ConnectionPhase {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::Connecting,
            1 => Self::Authenticated,
            2 => Self::Anonymous,
            3 => Self::Active,
            _ => Self::Disconnected,
        }
    }

    /// Whether the machine may move from `self` to `next`.
    pub fn can_advance(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Connecting, Self::Authenticated)
                | (Self::Connecting, Self::Anonymous)
                | (Self::Authenticated, Self::Active)
                | (Self::Anonymous, Self::Active)
                | (Self::Connecting, Self::Disconnected)
                | (Self::Authenticated, Self::Disconnected)
                | (Self::Anonymous, Self::Disconnected)
                | (Self::Active, Self::Disconnected)
        )
    }
}

/// A handle to a single live connection.
///
/// Holds the sender half of the connection's outbound queue plus the
/// resolved identity. Handles live only in the registry; nothing about a
/// connection is persisted.
#[derive(Debug)]
pub struct ConnectionHandle {
    /// Unique connection ID.
    pub id: ConnectionId,
    /// Identity attached before any handler ran.
    pub identity: Identity,
    /// When the connection was established.
    pub connected_at: DateTime<Utc>,
    /// Sender for serialized outbound events.
    sender: mpsc::Sender<String>,
    /// Current lifecycle phase.
    phase: AtomicU8,
}

impl ConnectionHandle {
    /// Create a handle in the `Connecting` phase.
    pub fn new(identity: Identity, sender: mpsc::Sender<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            identity,
            connected_at: Utc::now(),
            sender,
            phase: AtomicU8::new(ConnectionPhase::Connecting as u8),
        }
    }

    /// Current lifecycle phase.
    pub fn phase(&self) -> ConnectionPhase {
        ConnectionPhase::from_u8(self.phase.load(Ordering::SeqCst))
    }

    /// Attempt a phase transition. Returns `false` (leaving the phase
    /// unchanged) for transitions the state machine forbids, which makes
    /// double-disconnect a no-op.
    pub fn advance(&self, next: ConnectionPhase) -> bool {
        let mut current = self.phase.load(Ordering::SeqCst);
        loop {
            if !ConnectionPhase::from_u8(current).can_advance(next) {
                return false;
            }
            match self.phase.compare_exchange(
                current,
                next as u8,
                Ordering::SeqCst,
                Ordering::SeqCst,
            ) {
                Ok(_) => return true,
                Err(actual) => current = actual,
            }
        }
    }

    /// Whether the connection has not been torn down.
    pub fn is_live(&self) -> bool {
        self.phase() != ConnectionPhase::Disconnected
    }

    /// Queue an event for delivery to this connection.
    ///
    /// Returns `false` if the connection is gone or its queue is full; a
    /// slow client drops events rather than buffering without bound.
    pub fn send(&self, serialized: String) -> bool {
        if !self.is_live() {
            return false;
        }
        match self.sender.try_send(serialized) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(_)) => {
                tracing::warn!(conn_id = %self.id, "Outbound queue full, dropping event");
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                self.advance(ConnectionPhase::Disconnected);
                false
            }
        }
    }

    /// Serialize and queue a single event.
    pub fn send_event(&self, event: &ServerEvent) -> bool {
        match serde_json::to_string(event) {
            Ok(serialized) => self.send(serialized),
            Err(e) => {
                tracing::error!(error = %e, "Failed to serialize outbound event");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn handle() -> (ConnectionHandle, mpsc::Receiver<String>) {
        let (tx, rx) = mpsc::channel(8);
        (ConnectionHandle::new(Identity::Anonymous, tx), rx)
    }

    #[test]
    fn test_lifecycle_transitions() {
        let (conn, _rx) = handle();
        assert_eq!(conn.phase(), ConnectionPhase::Connecting);
        assert!(conn.advance(ConnectionPhase::Anonymous));
        assert!(!conn.advance(ConnectionPhase::Authenticated));
        assert!(conn.advance(ConnectionPhase::Active));
        assert!(conn.advance(ConnectionPhase::Disconnected));
    }

    #[test]
    fn test_no_way_back_from_disconnected() {
        let (conn, _rx) = handle();
        conn.advance(ConnectionPhase::Anonymous);
        conn.advance(ConnectionPhase::Disconnected);
        for phase in [
            ConnectionPhase::Connecting,
            ConnectionPhase::Authenticated,
            ConnectionPhase::Anonymous,
            ConnectionPhase::Active,
        ] {
            assert!(!conn.advance(phase));
        }
        assert_eq!(conn.phase(), ConnectionPhase::Disconnected);
    }

    #[test]
    fn test_send_after_disconnect_is_dropped() {
        let (conn, mut rx) = handle();
        conn.advance(ConnectionPhase::Anonymous);
        assert!(conn.send("hello".to_string()));
        conn.advance(ConnectionPhase::Disconnected);
        assert!(!conn.send("late".to_string()));
        assert_eq!(rx.try_recv().unwrap(), "hello");
        assert!(rx.try_recv().is_err());
    }
}
