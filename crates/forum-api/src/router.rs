//! Route definitions.

use axum::http::HeaderValue;
use axum::routing::get;
use axum::{Router, middleware as axum_middleware};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::middleware;
use crate::state::AppState;

/// Build the complete axum router.
///
/// Every `/api` route passes through the session-resolution middleware; the
/// WebSocket upgrade resolves through the same service inside the bridge.
pub fn build_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/health", get(handlers::health::health))
        .route("/session", get(handlers::session::current_session))
        .route("/presence/{username}", get(handlers::presence::presence))
        .route("/realtime/stats", get(handlers::presence::stats))
        .route("/push/public-key", get(handlers::push::public_key))
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::session::resolve_session,
        ));

    let ws_routes = Router::new().route("/ws", get(handlers::ws::ws_upgrade));

    Router::new()
        .nest("/api", api_routes)
        .merge(ws_routes)
        .layer(TraceLayer::new_for_http())
        .layer(build_cors_layer(&state))
        .with_state(state)
}

/// CORS policy from configuration.
fn build_cors_layer(state: &AppState) -> CorsLayer {
    let origins = &state.config.server.cors.allowed_origins;

    if origins.iter().any(|origin| origin == "*") {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let parsed: Vec<HeaderValue> = origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(parsed)
            .allow_methods(Any)
            .allow_headers(Any)
    }
}
