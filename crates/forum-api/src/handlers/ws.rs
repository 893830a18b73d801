//! WebSocket upgrade handler.
//!
//! The handshake extracts the session credential with the same helper the
//! HTTP middleware uses and hands it to the bridge; the socket is accepted
//! either way and carries the resolved (or anonymous) identity.

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{RawQuery, State, WebSocketUpgrade};
use axum::response::Response;
use axum_extra::extract::cookie::CookieJar;
use chrono::Utc;
use futures::{SinkExt, StreamExt};
use tracing::{debug, warn};

use forum_core::types::Identity;
use forum_entity::ephemeral::{EphemeralKind, EphemeralRecord};
use forum_realtime::bridge::HandshakeRequest;
use forum_realtime::events::ClientEvent;

use crate::middleware::session::extract_credential;
use crate::state::AppState;

/// GET /ws — upgrade to a real-time connection.
pub async fn ws_upgrade(
    State(state): State<AppState>,
    ws: WebSocketUpgrade,
    jar: CookieJar,
    RawQuery(query): RawQuery,
) -> Response {
    let credential = extract_credential(&jar, query.as_deref(), state.sessions.cookie_name());

    ws.on_upgrade(move |socket| handle_socket(state, credential, socket))
}

/// Drives one established connection until it closes.
async fn handle_socket(state: AppState, credential: Option<String>, socket: WebSocket) {
    // Registration (with the resolved identity attached) completes before
    // the handler loop below starts.
    let (handle, mut outbound) = state
        .bridge
        .connect(HandshakeRequest { credential })
        .await;
    let conn_id = handle.id;
    let identity = handle.identity;

    let (mut ws_tx, mut ws_rx) = socket.split();

    let forwarder = tokio::spawn(async move {
        while let Some(event) = outbound.recv().await {
            if ws_tx.send(Message::Text(event.into())).await.is_err() {
                break;
            }
        }
    });

    state.bridge.activate(&handle);

    while let Some(message) = ws_rx.next().await {
        match message {
            Ok(Message::Text(text)) => {
                handle_client_event(&state, identity, text.as_str()).await;
            }
            Ok(Message::Close(_)) => break,
            Ok(_) => {}
            Err(e) => {
                warn!(conn_id = %conn_id, error = %e, "WebSocket error");
                break;
            }
        }
    }

    // Every teardown path lands here exactly once; the bridge tolerates a
    // duplicate anyway.
    forwarder.abort();
    state.bridge.disconnect(&conn_id);
}

/// Handle one inbound client event.
async fn handle_client_event(state: &AppState, identity: Identity, raw: &str) {
    match serde_json::from_str::<ClientEvent>(raw) {
        Ok(ClientEvent::PresencePing) => {
            let record = EphemeralRecord::new(
                EphemeralKind::PresencePing,
                serde_json::json!({ "identity": identity }),
                Utc::now(),
            );
            if let Err(e) = state.ephemeral.insert(&record).await {
                warn!(error = %e, "Failed to record presence ping");
            }
        }
        Err(e) => {
            debug!(error = %e, "Ignoring unrecognized client event");
        }
    }
}
