//! Secret provisioning configuration.

use serde::{Deserialize, Serialize};

/// Secret provisioning configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecretsConfig {
    /// Whether the deployment allows persisting generated secrets back to
    /// the configuration surface. Platform-managed environments with no
    /// writable filesystem must leave this off; generated secrets then live
    /// only for the process lifetime.
    #[serde(default)]
    pub persist_generated: bool,
    /// Path of the dotenv-style file generated secrets are appended to when
    /// persistence is allowed.
    #[serde(default = "default_env_file")]
    pub env_file: String,
    /// Contact address handed to the push-notification subsystem.
    #[serde(default = "default_contact")]
    pub push_contact: String,
}

impl Default for SecretsConfig {
    fn default() -> Self {
        Self {
            persist_generated: false,
            env_file: default_env_file(),
            push_contact: default_contact(),
        }
    }
}

fn default_env_file() -> String {
    ".env".to_string()
}

fn default_contact() -> String {
    "mailto:admin@powrum.example".to_string()
}
