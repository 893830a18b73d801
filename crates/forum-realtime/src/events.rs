//! Outbound real-time event payloads.

use serde::{Deserialize, Serialize};

use forum_core::types::{Identity, UserId};

/// Events pushed to connected clients.
///
/// Serialized once per broadcast; per-connection delivery order follows the
/// connection's outbound queue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ServerEvent {
    /// Sent to a connection right after registration.
    Welcome {
        /// The identity the handshake resolved to.
        identity: Identity,
    },
    /// A user-targeted notification.
    Notification {
        /// Short title.
        title: String,
        /// Body text.
        body: String,
    },
    /// Another user's presence changed.
    PresenceChanged {
        /// The user whose presence changed.
        user_id: UserId,
        /// Whether they now have at least one live connection.
        online: bool,
    },
    /// A forum-wide announcement.
    Announcement {
        /// Announcement text.
        message: String,
    },
}

/// Events clients send over an established connection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ClientEvent {
    /// Liveness ping, recorded as an ephemeral presence record.
    PresencePing,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_wire_shape() {
        let json = serde_json::to_value(ServerEvent::Announcement {
            message: "maintenance at noon".to_string(),
        })
        .unwrap();
        assert_eq!(json["event"], "announcement");
        assert_eq!(json["message"], "maintenance at noon");
    }
}
