//! Session introspection handler.

use axum::{Extension, Json};
use serde::{Deserialize, Serialize};

use forum_core::types::Identity;

use crate::middleware::session::ResolvedIdentity;

/// The caller's resolved identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionResponse {
    /// `user` with an ID, or `anonymous`.
    pub identity: Identity,
}

/// GET /api/session
///
/// Reports whatever the session middleware resolved — the same answer a
/// realtime handshake from this caller would get.
pub async fn current_session(
    Extension(ResolvedIdentity(identity)): Extension<ResolvedIdentity>,
) -> Json<SessionResponse> {
    Json(SessionResponse { identity })
}
