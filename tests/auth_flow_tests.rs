//! Forced-logout flow: a 401 envelope clears the session and deflects to the
//! login route with history replacement, except on paths that never carry a
//! credential or are exempt from classification.

use std::sync::Arc;

use axum::extract::State;
use axum::http::HeaderMap;
use axum::routing::{get, post};
use axum::{Json, Router};
use parking_lot::Mutex;
use serde_json::{json, Value};

use mallkit::http::LOGIN_EXPIRED_NOTICE;
use mallkit::nav::{NavEvent, RecordingNavigator, RecordingNotifier};
use mallkit::{ApiClient, AuthSession, ClientConfig, RequestError};

async fn serve(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

async fn expired_envelope() -> Json<Value> {
    Json(json!({ "code": 401, "data": null, "msg": "token expired" }))
}

#[tokio::test]
async fn unauthorized_envelope_forces_logout_with_history_replacement() {
    let app = Router::new().route("/api/user/profile", get(expired_envelope));
    let base = serve(app).await;

    let session = AuthSession::in_memory();
    session.set("stale-token");
    let nav = Arc::new(RecordingNavigator::new());
    let notifier = Arc::new(RecordingNotifier::new());
    let cfg = ClientConfig { base_url: base, ..ClientConfig::default() };
    let client = ApiClient::new(cfg, session.clone(), nav.clone(), notifier.clone()).unwrap();

    let err = client.get::<Value>("/api/user/profile", None).await.unwrap_err();
    match err {
        RequestError::AuthExpired(env) => assert_eq!(env.code, 401),
        other => panic!("expected auth expiry, got {other:?}"),
    }
    // Session cleared, user toasted, navigated to login replacing history.
    assert!(!session.is_authenticated());
    assert!(notifier
        .toasts()
        .iter()
        .any(|(kind, msg)| kind == "fail" && msg == LOGIN_EXPIRED_NOTICE));
    assert_eq!(
        nav.events(),
        vec![NavEvent::Navigate { path: "/login".to_string(), replace: true }]
    );
}

#[tokio::test]
async fn unauthorized_on_a_no_credential_path_is_not_a_logout() {
    let app = Router::new().route("/app/main/getToken", get(expired_envelope));
    let base = serve(app).await;

    let session = AuthSession::in_memory();
    session.set("still-good");
    let nav = Arc::new(RecordingNavigator::new());
    let notifier = Arc::new(RecordingNotifier::new());
    let cfg = ClientConfig { base_url: base, ..ClientConfig::default() };
    let client = ApiClient::new(cfg, session.clone(), nav.clone(), notifier.clone()).unwrap();

    let err = client.get::<Value>("app/main/getToken", None).await.unwrap_err();
    // Ordinary business failure: session intact, no navigation.
    assert!(matches!(err, RequestError::Business(_)));
    assert!(session.is_authenticated());
    assert!(nav.events().is_empty());
}

#[tokio::test]
async fn unauthorized_on_an_allow_listed_path_has_no_effects_at_all() {
    let app = Router::new().route("/api/user/profile", get(expired_envelope));
    let base = serve(app).await;

    let session = AuthSession::in_memory();
    session.set("still-good");
    let nav = Arc::new(RecordingNavigator::new());
    let notifier = Arc::new(RecordingNotifier::new());
    let cfg = ClientConfig {
        base_url: base,
        classify_bypass: vec!["^/api/user/profile".to_string()],
        ..ClientConfig::default()
    };
    let client = ApiClient::new(cfg, session.clone(), nav.clone(), notifier.clone()).unwrap();

    let err = client.get::<Value>("/api/user/profile", None).await.unwrap_err();
    assert!(matches!(err, RequestError::Business(_)));
    assert!(session.is_authenticated());
    assert!(nav.events().is_empty());
    assert!(notifier.toasts().is_empty());
}

#[tokio::test]
async fn credential_header_is_attached_only_when_authenticated() {
    #[derive(Clone, Default)]
    struct Seen(Arc<Mutex<Vec<Option<String>>>>);

    async fn echo_token(State(seen): State<Seen>, headers: HeaderMap) -> Json<Value> {
        let tok = headers.get("token").and_then(|v| v.to_str().ok()).map(String::from);
        seen.0.lock().push(tok);
        Json(json!({ "code": 200, "data": null, "msg": "ok" }))
    }

    let seen = Seen::default();
    let app = Router::new()
        .route("/api/ping", post(echo_token))
        .with_state(seen.clone());
    let base = serve(app).await;

    let session = AuthSession::in_memory();
    let cfg = ClientConfig { base_url: base, ..ClientConfig::default() };
    let client = ApiClient::new(
        cfg,
        session.clone(),
        Arc::new(RecordingNavigator::new()),
        Arc::new(RecordingNotifier::new()),
    )
    .unwrap();

    client.post::<Value>("/api/ping", None).await.unwrap();
    session.set("tok-123");
    client.post::<Value>("/api/ping", None).await.unwrap();

    let calls = seen.0.lock().clone();
    assert_eq!(calls, vec![None, Some("tok-123".to_string())]);
}
