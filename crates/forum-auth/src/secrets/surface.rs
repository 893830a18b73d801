//! The external configuration surface secrets are read from and written to.

use std::io::Write;
use std::path::PathBuf;

use forum_core::error::AppError;
use forum_core::result::AppResult;

use super::PersistenceCapability;

/// Outcome of a persist attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersistOutcome {
    /// The value was written back and will survive a restart.
    Persisted,
    /// The deployment forbids writes; the value is memory-only.
    Skipped,
}

/// A named key-value secret store read at startup.
pub trait SecretSurface: Send + Sync {
    /// Look up a secret by name.
    fn get(&self, name: &str) -> Option<String>;

    /// Attempt to write a generated secret back for reuse on the next
    /// restart. Implementations honoring an ephemeral deployment return
    /// [`PersistOutcome::Skipped`] instead of failing.
    fn persist(&self, name: &str, value: &str) -> AppResult<PersistOutcome>;
}

/// Secret surface backed by process environment variables, with a
/// dotenv-style file as the write-back target.
///
/// Secret names are lower-snake-case; the corresponding environment variable
/// is the upper-case form (`session_signing_key` → `SESSION_SIGNING_KEY`).
#[derive(Debug)]
pub struct EnvSecretSurface {
    capability: PersistenceCapability,
    env_file: PathBuf,
}

impl EnvSecretSurface {
    /// Create a surface with the given write capability.
    pub fn new(capability: PersistenceCapability, env_file: impl Into<PathBuf>) -> Self {
        Self {
            capability,
            env_file: env_file.into(),
        }
    }
}

impl SecretSurface for EnvSecretSurface {
    fn get(&self, name: &str) -> Option<String> {
        std::env::var(name.to_uppercase())
            .ok()
            .filter(|v| !v.is_empty())
    }

    fn persist(&self, name: &str, value: &str) -> AppResult<PersistOutcome> {
        match self.capability {
            PersistenceCapability::Ephemeral => Ok(PersistOutcome::Skipped),
            PersistenceCapability::Persistent => {
                let mut file = std::fs::OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(&self.env_file)
                    .map_err(|e| {
                        AppError::configuration(format!(
                            "Failed to open {} for secret write-back: {e}",
                            self.env_file.display()
                        ))
                    })?;
                writeln!(file, "{}={}", name.to_uppercase(), value).map_err(|e| {
                    AppError::configuration(format!("Failed to write secret back: {e}"))
                })?;
                Ok(PersistOutcome::Persisted)
            }
        }
    }
}
