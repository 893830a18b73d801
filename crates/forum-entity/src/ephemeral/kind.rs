//! Ephemeral record kinds.

use std::fmt;
use std::str::FromStr;

use chrono::Duration;
use serde::{Deserialize, Serialize};

use forum_core::config::retention::RetentionConfig;

/// The kinds of short-lived records the maintenance sweep prunes.
///
/// Each kind carries its own retention window; a record older than the
/// window for its kind does not survive the next sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EphemeralKind {
    /// Liveness pings emitted by connected clients.
    PresencePing,
    /// Moderation/audit trail entries.
    AuditEntry,
    /// Short-lived direct messages.
    TransientMessage,
}

impl EphemeralKind {
    /// Every kind, in sweep order.
    pub const ALL: [EphemeralKind; 3] = [
        Self::PresencePing,
        Self::AuditEntry,
        Self::TransientMessage,
    ];

    /// The retention window configured for this kind.
    pub fn retention_window(&self, retention: &RetentionConfig) -> Duration {
        match self {
            Self::PresencePing => retention.presence_ping_window(),
            Self::AuditEntry => retention.audit_entry_window(),
            Self::TransientMessage => retention.transient_message_window(),
        }
    }

    /// Return the kind as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PresencePing => "presence_ping",
            Self::AuditEntry => "audit_entry",
            Self::TransientMessage => "transient_message",
        }
    }
}

impl fmt::Display for EphemeralKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for EphemeralKind {
    type Err = forum_core::AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "presence_ping" => Ok(Self::PresencePing),
            "audit_entry" => Ok(Self::AuditEntry),
            "transient_message" => Ok(Self::TransientMessage),
            _ => Err(forum_core::AppError::validation(format!(
                "Unknown ephemeral record kind: '{s}'"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_each_kind_has_its_own_window() {
        let retention = RetentionConfig::default();
        let windows: Vec<Duration> = EphemeralKind::ALL
            .iter()
            .map(|k| k.retention_window(&retention))
            .collect();
        assert!(windows.iter().all(|w| *w > Duration::zero()));
        assert_ne!(windows[0], windows[1]);
    }

    #[test]
    fn test_string_roundtrip() {
        for kind in EphemeralKind::ALL {
            assert_eq!(kind.as_str().parse::<EphemeralKind>().unwrap(), kind);
        }
    }
}
