//! Presence and realtime stats handlers.

use axum::Json;
use axum::extract::{Path, State};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use forum_core::error::AppError;
use forum_core::types::Identity;

use crate::error::ApiError;
use crate::state::AppState;

/// Presence of a single account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PresenceResponse {
    /// The queried username.
    pub username: String,
    /// Whether the account has at least one live connection.
    pub online: bool,
    /// Number of live connections (tabs/devices).
    pub connections: usize,
    /// When the oldest live connection was established.
    pub connected_since: Option<DateTime<Utc>>,
}

/// GET /api/presence/{username}
pub async fn presence(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Result<Json<PresenceResponse>, ApiError> {
    let account = state
        .accounts
        .find_by_username(&username)
        .await?
        .ok_or_else(|| AppError::not_found(format!("No account named '{username}'")))?;

    let connections = state.registry.list_by_identity(&Identity::User(account.id));

    Ok(Json(PresenceResponse {
        username,
        online: !connections.is_empty(),
        connections: connections.len(),
        connected_since: connections.first().map(|c| c.connected_at),
    }))
}

/// Aggregate realtime stats.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatsResponse {
    /// Total live connections, anonymous included.
    pub connections: usize,
    /// Distinct identities with a live connection.
    pub identities: usize,
}

/// GET /api/realtime/stats
pub async fn stats(State(state): State<AppState>) -> Json<StatsResponse> {
    Json(StatsResponse {
        connections: state.registry.connection_count(),
        identities: state.registry.identity_count(),
    })
}
