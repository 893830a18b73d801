//! Router-level tests driving the HTTP surface over the in-memory store.

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use chrono::Utc;
use http::{Request, StatusCode};
use serde_json::Value;
use tower::ServiceExt;

use forum_api::AppState;
use forum_auth::SessionService;
use forum_core::config::AppConfig;
use forum_core::config::session::SessionConfig;
use forum_core::types::UserId;
use forum_database::memory::MemoryForumStore;
use forum_database::{AccountStore, EphemeralStore, SessionStore};
use forum_entity::account::Account;
use forum_realtime::bridge::HandshakeRequest;
use forum_realtime::{ConnectionRegistry, PushGateway, SessionBridge};

/// Test application context.
struct TestApp {
    router: Router,
    store: Arc<MemoryForumStore>,
    sessions: SessionService,
    bridge: Arc<SessionBridge>,
    push: Arc<PushGateway>,
}

impl TestApp {
    fn new() -> Self {
        let store = Arc::new(MemoryForumStore::new());
        let sessions = SessionService::new(
            Arc::clone(&store) as Arc<dyn SessionStore>,
            "integration-test-key",
            SessionConfig::default(),
        );
        let registry = Arc::new(ConnectionRegistry::new());
        let bridge = Arc::new(SessionBridge::new(
            sessions.clone(),
            Arc::clone(&registry),
            16,
        ));
        let push = Arc::new(PushGateway::new());

        let state = AppState {
            config: Arc::new(AppConfig::default()),
            sessions: sessions.clone(),
            registry,
            bridge: Arc::clone(&bridge),
            push: Arc::clone(&push),
            accounts: Arc::clone(&store) as Arc<dyn AccountStore>,
            ephemeral: Arc::clone(&store) as Arc<dyn EphemeralStore>,
        };

        Self {
            router: forum_api::build_router(state),
            store,
            sessions,
            bridge,
            push,
        }
    }

    async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.request(Request::get(uri).body(Body::empty()).unwrap())
            .await
    }

    async fn request(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }
}

#[tokio::test]
async fn test_health() {
    let app = TestApp::new();
    let (status, body) = app.get("/api/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_session_route_reports_anonymous_without_credential() {
    let app = TestApp::new();
    let (status, body) = app.get("/api/session").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["identity"]["kind"], "anonymous");
}

#[tokio::test]
async fn test_session_cookie_resolves_to_the_issued_user() {
    let app = TestApp::new();
    let user = UserId::new();
    let (_, token) = app.sessions.issue(Some(user)).await.unwrap();

    let request = Request::get("/api/session")
        .header("cookie", format!("forum_session={token}"))
        .body(Body::empty())
        .unwrap();
    let (status, body) = app.request(request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["identity"]["kind"], "user");
    assert_eq!(body["identity"]["user_id"], user.to_string());
}

#[tokio::test]
async fn test_tampered_cookie_degrades_to_anonymous() {
    let app = TestApp::new();
    let request = Request::get("/api/session")
        .header("cookie", "forum_session=tampered-token")
        .body(Body::empty())
        .unwrap();
    let (status, body) = app.request(request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["identity"]["kind"], "anonymous");
}

#[tokio::test]
async fn test_presence_for_unknown_account_is_404() {
    let app = TestApp::new();
    let (status, _) = app.get("/api/presence/nobody").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_presence_reflects_live_connections() {
    let app = TestApp::new();

    let alice = Account::new("alice", Utc::now());
    AccountStore::insert(app.store.as_ref(), &alice)
        .await
        .unwrap();

    let (status, body) = app.get("/api/presence/alice").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["online"], false);
    assert_eq!(body["connections"], 0);

    // Two tabs connect with the same session credential.
    let (_, token) = app.sessions.issue(Some(alice.id)).await.unwrap();
    let (_c1, _rx1) = app
        .bridge
        .connect(HandshakeRequest {
            credential: Some(token.clone()),
        })
        .await;
    let (_c2, _rx2) = app
        .bridge
        .connect(HandshakeRequest {
            credential: Some(token),
        })
        .await;

    let (status, body) = app.get("/api/presence/alice").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["online"], true);
    assert_eq!(body["connections"], 2);
}

#[tokio::test]
async fn test_realtime_stats_count_anonymous_connections() {
    let app = TestApp::new();

    let (status, body) = app.get("/api/realtime/stats").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["connections"], 0);

    let (_conn, _rx) = app.bridge.connect(HandshakeRequest::default()).await;

    let (_, body) = app.get("/api/realtime/stats").await;
    assert_eq!(body["connections"], 1);
    assert_eq!(body["identities"], 1);
}

#[tokio::test]
async fn test_push_public_key_requires_configuration() {
    let app = TestApp::new();

    let (status, _) = app.get("/api/push/public-key").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);

    app.push.configure(
        "public".to_string(),
        "private".to_string(),
        "mailto:admin@powrum.example".to_string(),
    );

    let (status, body) = app.get("/api/push/public-key").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["public_key"], "public");
}
