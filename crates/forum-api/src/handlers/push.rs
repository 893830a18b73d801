//! Push-subscription support handlers.

use axum::Json;
use axum::extract::State;
use serde::{Deserialize, Serialize};

use forum_core::error::AppError;

use crate::error::ApiError;
use crate::state::AppState;

/// Public half of the push key pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PushKeyResponse {
    /// Base64url public key clients subscribe against.
    pub public_key: String,
}

/// GET /api/push/public-key
pub async fn public_key(
    State(state): State<AppState>,
) -> Result<Json<PushKeyResponse>, ApiError> {
    let public_key = state
        .push
        .public_key()
        .ok_or_else(|| AppError::service_unavailable("Push subsystem not configured"))?;

    Ok(Json(PushKeyResponse { public_key }))
}
