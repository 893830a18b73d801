//! Forum-wide configuration document.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single forum-wide setting.
///
/// At most one document exists per `key`. The bootstrap reconciler seeds
/// missing defaults with a conflict-free insert; admin routes mutate the
/// values afterwards, and those edits must survive restarts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForumSetting {
    /// Unique setting key.
    pub key: String,
    /// Current value.
    pub value: String,
    /// When the value last changed.
    pub updated_at: DateTime<Utc>,
}

impl ForumSetting {
    /// Create a setting document.
    pub fn new(key: impl Into<String>, value: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            updated_at: now,
        }
    }
}
