use std::{sync::Arc, time::Duration};

use api::auth::{Role, generate_jwt};
use api::routes::routes;
use axum::{
    Router,
    body::Body,
    http::{HeaderMap, Request, StatusCode, header::CONTENT_TYPE},
};
use cache::{MemoryStore, TokenManager, TokenSettings};
use db::test_utils::setup_test_db;
use sea_orm::DatabaseConnection;
use serde_json::Value;
use tower::ServiceExt;
use util::{config::AppConfig, state::AppState};

pub const TEST_SECRET: &str = "integration-test-secret";

pub struct TestApp {
    pub db: DatabaseConnection,
    pub store: Arc<MemoryStore>,
    pub tokens: TokenManager,
    router: Router,
}

impl TestApp {
    /// Sends one request through the router and decodes the JSON body
    /// (`Value::Null` when there is none).
    pub async fn send(&self, req: Request<Body>) -> (StatusCode, HeaderMap, Value) {
        let response = self.router.clone().oneshot(req).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = serde_json::from_slice(&body).unwrap_or(Value::Null);
        (status, headers, json)
    }
}

/// Fresh in-memory database and store behind the full `/api` router.
///
/// The dedup window is shortened so tests can re-scan after a short sleep.
pub async fn make_app() -> TestApp {
    AppConfig::set_jwt_secret(TEST_SECRET);
    AppConfig::set_session_default_minutes(5);

    let db = setup_test_db().await;
    let store = Arc::new(MemoryStore::new());
    let tokens = TokenManager::new(
        store.clone(),
        TokenSettings {
            dedup: Duration::from_millis(50),
            ..TokenSettings::default()
        },
    );

    let state = AppState::new(db.clone(), tokens.clone());
    let router = Router::new().nest("/api", routes(state));

    TestApp {
        db,
        store,
        tokens,
        router,
    }
}

pub fn bearer(id: i64, role: Role) -> String {
    let (token, _) = generate_jwt(id, role).unwrap();
    token
}

/// JSON request with an optional bearer token and a fixed forwarded client IP.
pub fn json_request(method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("x-forwarded-for", "203.0.113.7");

    if let Some(token) = token {
        builder = builder.header("Authorization", format!("Bearer {token}"));
    }

    match body {
        Some(body) => builder
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(serde_json::to_vec(&body).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}
