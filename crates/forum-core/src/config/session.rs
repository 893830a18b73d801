//! Session management configuration.

use serde::{Deserialize, Serialize};

/// Session management configuration.
///
/// Sessions use a rolling expiry: every authenticated access pushes the
/// expiry out by `rolling_window_hours`, bounded by an absolute cap of
/// `max_lifetime_days` from session creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Name of the session cookie.
    #[serde(default = "default_cookie_name")]
    pub cookie_name: String,
    /// Rolling expiry window in hours, extended on each authenticated access.
    #[serde(default = "default_rolling_window")]
    pub rolling_window_hours: u64,
    /// Absolute maximum session lifetime in days, regardless of activity.
    #[serde(default = "default_max_lifetime")]
    pub max_lifetime_days: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cookie_name: default_cookie_name(),
            rolling_window_hours: default_rolling_window(),
            max_lifetime_days: default_max_lifetime(),
        }
    }
}

fn default_cookie_name() -> String {
    "forum_session".to_string()
}

fn default_rolling_window() -> u64 {
    24
}

fn default_max_lifetime() -> u64 {
    365
}
