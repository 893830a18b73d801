//! Push-notification subsystem seam.

use std::sync::RwLock;

use tracing::info;

/// Credentials the push subsystem signs deliveries with.
#[derive(Debug, Clone)]
pub struct PushCredentials {
    /// Base64url public key, handed to subscribing clients.
    pub public_key: String,
    /// Base64url private key.
    pub private_key: String,
    /// Operator contact address.
    pub contact: String,
}

/// The push-notification collaborator.
///
/// Configured once at bootstrap with the provisioned key pair. When a
/// deployment cannot persist generated secrets, a restart configures a fresh
/// pair; subscriptions issued under the old keys stop validating and clients
/// re-subscribe against the new public key.
#[derive(Debug, Default)]
pub struct PushGateway {
    credentials: RwLock<Option<PushCredentials>>,
}

impl PushGateway {
    /// Create an unconfigured gateway.
    pub fn new() -> Self {
        Self::default()
    }

    /// Install signing credentials, replacing any previous pair.
    pub fn configure(&self, public_key: String, private_key: String, contact: String) {
        let mut slot = match self.credentials.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if slot.is_some() {
            info!("Push credentials replaced; existing subscriptions are invalidated");
        } else {
            info!("Push subsystem configured");
        }
        *slot = Some(PushCredentials {
            public_key,
            private_key,
            contact,
        });
    }

    /// Whether credentials are installed.
    pub fn is_configured(&self) -> bool {
        self.read().is_some()
    }

    /// The public key clients subscribe against.
    pub fn public_key(&self) -> Option<String> {
        self.read().map(|c| c.public_key.clone())
    }

    fn read(&self) -> Option<PushCredentials> {
        let guard = match self.credentials.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        guard.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configure_replaces_credentials() {
        let gateway = PushGateway::new();
        assert!(!gateway.is_configured());

        gateway.configure("pk1".into(), "sk1".into(), "mailto:a@b".into());
        assert_eq!(gateway.public_key().as_deref(), Some("pk1"));

        gateway.configure("pk2".into(), "sk2".into(), "mailto:a@b".into());
        assert_eq!(gateway.public_key().as_deref(), Some("pk2"));
    }
}
