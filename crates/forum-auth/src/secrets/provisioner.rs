//! Exactly-once provisioning of process-wide cryptographic material.

use std::sync::Arc;

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use dashmap::DashMap;
use ed25519_dalek::SigningKey;
use rand::TryRngCore;
use rand::rngs::OsRng;
use tracing::{info, warn};

use forum_core::error::AppError;
use forum_core::result::AppResult;

use super::surface::{PersistOutcome, SecretSurface};

/// Length in bytes of generated symmetric keys (256 bits).
const SYMMETRIC_KEY_LEN: usize = 32;

/// An asymmetric key pair for the push-notification subsystem.
#[derive(Debug, Clone)]
pub struct PushKeys {
    /// Base64url-encoded Ed25519 public key.
    pub public_key: String,
    /// Base64url-encoded Ed25519 private seed.
    pub private_key: String,
    /// Whether the pair was generated during this startup rather than read
    /// from the configuration surface. Fresh keys invalidate previously
    /// issued push subscriptions.
    pub freshly_generated: bool,
}

/// Ensures required secrets exist exactly once per deployment lifetime.
///
/// Values resolve in order: process cache, configuration surface, fresh
/// generation. A generated value is handed to dependents immediately
/// regardless of whether write-back succeeded, so the same process always
/// sees one value per name.
pub struct SecretProvisioner {
    surface: Arc<dyn SecretSurface>,
    values: DashMap<String, String>,
    key_pairs: DashMap<String, PushKeys>,
}

impl std::fmt::Debug for SecretProvisioner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecretProvisioner").finish()
    }
}

impl SecretProvisioner {
    /// Create a provisioner over the given configuration surface.
    pub fn new(surface: Arc<dyn SecretSurface>) -> Self {
        Self {
            surface,
            values: DashMap::new(),
            key_pairs: DashMap::new(),
        }
    }

    /// Ensure a named symmetric secret exists, generating it if absent.
    ///
    /// Repeated calls for the same name within one process return the
    /// identical value. Generation failure is fatal to startup.
    pub fn ensure_secret(&self, name: &str) -> AppResult<String> {
        if let Some(cached) = self.values.get(name) {
            return Ok(cached.value().clone());
        }

        if let Some(existing) = self.surface.get(name) {
            self.values.insert(name.to_string(), existing.clone());
            return Ok(existing);
        }

        let value = generate_symmetric_key()?;
        self.write_back(name, &value)?;
        self.values.insert(name.to_string(), value.clone());
        Ok(value)
    }

    /// Ensure the named asymmetric pair exists, generating both halves
    /// together if either is absent.
    pub fn ensure_push_keys(
        &self,
        public_name: &str,
        private_name: &str,
    ) -> AppResult<PushKeys> {
        if let Some(cached) = self.key_pairs.get(public_name) {
            return Ok(cached.value().clone());
        }

        let keys = match (self.surface.get(public_name), self.surface.get(private_name)) {
            (Some(public_key), Some(private_key)) => PushKeys {
                public_key,
                private_key,
                freshly_generated: false,
            },
            _ => {
                let (public_key, private_key) = generate_key_pair()?;
                self.write_back(public_name, &public_key)?;
                self.write_back(private_name, &private_key)?;
                PushKeys {
                    public_key,
                    private_key,
                    freshly_generated: true,
                }
            }
        };

        self.key_pairs.insert(public_name.to_string(), keys.clone());
        Ok(keys)
    }

    fn write_back(&self, name: &str, value: &str) -> AppResult<()> {
        match self.surface.persist(name, value)? {
            PersistOutcome::Persisted => {
                info!(secret = name, "Generated secret persisted to configuration surface");
            }
            PersistOutcome::Skipped => {
                warn!(
                    secret = name,
                    "Deployment forbids secret persistence; value is process-lifetime only and \
                     will regenerate on restart"
                );
            }
        }
        Ok(())
    }
}

/// Generate a 256-bit symmetric key from OS entropy, base64url-encoded.
fn generate_symmetric_key() -> AppResult<String> {
    let mut bytes = [0u8; SYMMETRIC_KEY_LEN];
    OsRng.try_fill_bytes(&mut bytes).map_err(|e| {
        AppError::secret_generation(format!("OS entropy source unavailable: {e}"))
    })?;
    Ok(URL_SAFE_NO_PAD.encode(bytes))
}

/// Generate an Ed25519 key pair from an OS-entropy seed.
fn generate_key_pair() -> AppResult<(String, String)> {
    let mut seed = [0u8; 32];
    OsRng.try_fill_bytes(&mut seed).map_err(|e| {
        AppError::secret_generation(format!("OS entropy source unavailable: {e}"))
    })?;

    let signing_key = SigningKey::from_bytes(&seed);
    let public_key = URL_SAFE_NO_PAD.encode(signing_key.verifying_key().to_bytes());
    let private_key = URL_SAFE_NO_PAD.encode(seed);
    Ok((public_key, private_key))
}

#[cfg(test)]
mod tests {
    use dashmap::DashMap;

    use super::*;

    /// Surface double with controllable contents and capability.
    #[derive(Default)]
    struct MapSurface {
        values: DashMap<String, String>,
        forbid_writes: bool,
    }

    impl SecretSurface for MapSurface {
        fn get(&self, name: &str) -> Option<String> {
            self.values.get(name).map(|v| v.value().clone())
        }

        fn persist(&self, name: &str, value: &str) -> AppResult<PersistOutcome> {
            if self.forbid_writes {
                return Ok(PersistOutcome::Skipped);
            }
            self.values.insert(name.to_string(), value.to_string());
            Ok(PersistOutcome::Persisted)
        }
    }

    #[test]
    fn test_second_call_returns_identical_value() {
        let provisioner = SecretProvisioner::new(Arc::new(MapSurface::default()));
        let first = provisioner.ensure_secret("session_signing_key").unwrap();
        let second = provisioner.ensure_secret("session_signing_key").unwrap();
        assert_eq!(first, second);
        assert!(!first.is_empty());
    }

    #[test]
    fn test_existing_surface_value_wins() {
        let surface = MapSurface::default();
        surface
            .values
            .insert("session_signing_key".to_string(), "preset".to_string());
        let provisioner = SecretProvisioner::new(Arc::new(surface));
        assert_eq!(
            provisioner.ensure_secret("session_signing_key").unwrap(),
            "preset"
        );
    }

    #[test]
    fn test_forbidden_persistence_still_yields_a_value() {
        let surface = MapSurface {
            forbid_writes: true,
            ..Default::default()
        };
        let provisioner = SecretProvisioner::new(Arc::new(surface));
        let value = provisioner.ensure_secret("session_signing_key").unwrap();
        // The value is usable for the process lifetime even though nothing
        // was written back.
        assert_eq!(
            provisioner.ensure_secret("session_signing_key").unwrap(),
            value
        );
    }

    #[test]
    fn test_push_keys_fresh_flag() {
        let provisioner = SecretProvisioner::new(Arc::new(MapSurface::default()));
        let first = provisioner
            .ensure_push_keys("push_public_key", "push_private_key")
            .unwrap();
        assert!(first.freshly_generated);

        // Same process: cached pair, still flagged as generated this run.
        let again = provisioner
            .ensure_push_keys("push_public_key", "push_private_key")
            .unwrap();
        assert_eq!(first.public_key, again.public_key);

        // A later deployment that finds both halves on the surface does not
        // regenerate.
        let surface = MapSurface::default();
        surface
            .values
            .insert("push_public_key".to_string(), first.public_key.clone());
        surface
            .values
            .insert("push_private_key".to_string(), first.private_key.clone());
        let next_start = SecretProvisioner::new(Arc::new(surface));
        let restored = next_start
            .ensure_push_keys("push_public_key", "push_private_key")
            .unwrap();
        assert!(!restored.freshly_generated);
        assert_eq!(restored.public_key, first.public_key);
    }
}
