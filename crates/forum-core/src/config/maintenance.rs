//! Maintenance sweep configuration.

use serde::{Deserialize, Serialize};

/// Maintenance scheduler configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaintenanceConfig {
    /// Whether the scheduler runs at all.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Cron schedule for the recurring sweep (seconds-resolution cron).
    #[serde(default = "default_schedule")]
    pub schedule: String,
    /// Whether to run one sweep immediately at startup.
    #[serde(default = "default_true")]
    pub run_on_startup: bool,
}

impl Default for MaintenanceConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            schedule: default_schedule(),
            run_on_startup: true,
        }
    }
}

fn default_schedule() -> String {
    // Daily at 4 AM.
    "0 0 4 * * *".to_string()
}

fn default_true() -> bool {
    true
}
