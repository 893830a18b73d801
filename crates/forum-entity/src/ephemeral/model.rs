//! Ephemeral record model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use forum_core::types::RecordId;

use super::kind::EphemeralKind;

/// A short-lived record (presence ping, audit entry, transient message).
///
/// Records are append-only; the maintenance sweep deletes them once they age
/// past their kind's retention window, comparing on `created_at`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EphemeralRecord {
    /// Unique record identifier.
    pub id: RecordId,
    /// Record kind, selecting the retention window.
    pub kind: EphemeralKind,
    /// Kind-specific payload.
    pub payload: serde_json::Value,
    /// Creation timestamp the sweep predicate compares against.
    pub created_at: DateTime<Utc>,
}

impl EphemeralRecord {
    /// Create a record stamped at `now`.
    pub fn new(kind: EphemeralKind, payload: serde_json::Value, now: DateTime<Utc>) -> Self {
        Self {
            id: RecordId::new(),
            kind,
            payload,
            created_at: now,
        }
    }

    /// Whether the record has outlived the given retention cutoff.
    pub fn is_older_than(&self, cutoff: DateTime<Utc>) -> bool {
        self.created_at < cutoff
    }
}
