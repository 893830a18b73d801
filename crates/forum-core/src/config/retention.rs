//! Ephemeral record retention windows.

use chrono::Duration;
use serde::{Deserialize, Serialize};

/// Per-kind retention windows for ephemeral records.
///
/// A record older than its kind's window is eligible for deletion on the
/// next maintenance sweep.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetentionConfig {
    /// Presence pings: minutes.
    #[serde(default = "default_presence_ping_minutes")]
    pub presence_ping_minutes: u64,
    /// Audit entries: days.
    #[serde(default = "default_audit_entry_days")]
    pub audit_entry_days: u64,
    /// Transient messages: days.
    #[serde(default = "default_transient_message_days")]
    pub transient_message_days: u64,
}

impl RetentionConfig {
    /// Window for presence pings.
    pub fn presence_ping_window(&self) -> Duration {
        Duration::minutes(self.presence_ping_minutes as i64)
    }

    /// Window for audit entries.
    pub fn audit_entry_window(&self) -> Duration {
        Duration::days(self.audit_entry_days as i64)
    }

    /// Window for transient messages.
    pub fn transient_message_window(&self) -> Duration {
        Duration::days(self.transient_message_days as i64)
    }
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self {
            presence_ping_minutes: default_presence_ping_minutes(),
            audit_entry_days: default_audit_entry_days(),
            transient_message_days: default_transient_message_days(),
        }
    }
}

fn default_presence_ping_minutes() -> u64 {
    30
}

fn default_audit_entry_days() -> u64 {
    90
}

fn default_transient_message_days() -> u64 {
    7
}
