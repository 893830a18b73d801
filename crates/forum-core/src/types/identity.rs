//! Resolved caller identity.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::id::UserId;

/// The identity a session (or real-time connection) resolves to.
///
/// Every connection carries exactly one of these. A failed or absent
/// credential resolves to [`Identity::Anonymous`] rather than an error, so
/// real-time features degrade instead of refusing the handshake.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "user_id", rename_all = "snake_case")]
pub enum Identity {
    /// An authenticated account.
    User(UserId),
    /// The anonymous marker.
    Anonymous,
}

impl Identity {
    /// Whether this identity is the anonymous marker.
    pub fn is_anonymous(&self) -> bool {
        matches!(self, Self::Anonymous)
    }

    /// The account ID, if authenticated.
    pub fn user_id(&self) -> Option<UserId> {
        match self {
            Self::User(id) => Some(*id),
            Self::Anonymous => None,
        }
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::User(id) => write!(f, "user:{id}"),
            Self::Anonymous => write!(f, "anonymous"),
        }
    }
}

impl From<UserId> for Identity {
    fn from(id: UserId) -> Self {
        Self::User(id)
    }
}
