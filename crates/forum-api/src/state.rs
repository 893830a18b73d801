//! Shared application state threaded through every handler.

use std::sync::Arc;

use forum_auth::SessionService;
use forum_core::config::AppConfig;
use forum_database::{AccountStore, EphemeralStore};
use forum_realtime::{ConnectionRegistry, PushGateway, SessionBridge};

/// State injected into all routes via axum's `State` extractor.
///
/// The registry and bridge are constructed once at startup and passed here
/// explicitly — route handlers never reach for ambient globals.
#[derive(Clone)]
pub struct AppState {
    /// Merged application configuration.
    pub config: Arc<AppConfig>,
    /// The single session-resolution path (shared with the bridge).
    pub sessions: SessionService,
    /// Live connection index.
    pub registry: Arc<ConnectionRegistry>,
    /// Handshake interceptor for the realtime transport.
    pub bridge: Arc<SessionBridge>,
    /// Push-notification collaborator.
    pub push: Arc<PushGateway>,
    /// Account lookups for presence queries.
    pub accounts: Arc<dyn AccountStore>,
    /// Presence pings and other short-lived records.
    pub ephemeral: Arc<dyn EphemeralStore>,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState").finish()
    }
}
