//! Signed session credential codec.
//!
//! The credential a browser carries is a compact signed token wrapping the
//! opaque session ID. Everything else about the session (identity, rolling
//! expiry) lives in the store; the token only proves the ID was issued by
//! this deployment.

use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use forum_core::error::AppError;
use forum_core::result::AppResult;
use forum_core::types::SessionId;
use forum_entity::session::SessionRecord;

/// Claims embedded in a session credential.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    /// The stored session's ID.
    pub sid: Uuid,
    /// Issued-at timestamp (seconds since epoch).
    pub iat: i64,
    /// Expiration timestamp (seconds since epoch). Mirrors the session's
    /// absolute cap; the store enforces the real rolling expiry.
    pub exp: i64,
}

/// Signs and verifies session credentials.
#[derive(Clone)]
pub struct SessionTokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl std::fmt::Debug for SessionTokenCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionTokenCodec").finish()
    }
}

impl SessionTokenCodec {
    /// Create a codec keyed by the provisioned signing secret.
    pub fn new(signing_key: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.leeway = 5;

        Self {
            encoding_key: EncodingKey::from_secret(signing_key.as_bytes()),
            decoding_key: DecodingKey::from_secret(signing_key.as_bytes()),
            validation,
        }
    }

    /// Produce the signed credential for a session.
    pub fn encode(&self, session: &SessionRecord) -> AppResult<String> {
        let claims = SessionClaims {
            sid: session.id.into_uuid(),
            iat: Utc::now().timestamp(),
            exp: session.absolute_expiry.timestamp(),
        };
        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| AppError::session(format!("Failed to sign session credential: {e}")))
    }

    /// Verify a credential and extract the session ID it wraps.
    pub fn decode(&self, token: &str) -> AppResult<SessionId> {
        let data = decode::<SessionClaims>(token, &self.decoding_key, &self.validation)
            .map_err(|e| AppError::session(format!("Invalid session credential: {e}")))?;
        Ok(SessionId::from_uuid(data.claims.sid))
    }
}
