//! End-to-end tests driving the real router

use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use chrono::Duration;
use gatehouse_api::routes::types::{CacheEntryResponse, CreateUserResponse, LoginResponse, UserResponse};
use gatehouse_api::{AppState, create_router};
use gatehouse_auth::SessionIssuer;
use gatehouse_db::{Database, Role};
use gatehouse_kv::{KvError, KvStore, MemoryStore};
use metrics_exporter_prometheus::PrometheusBuilder;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use std::sync::Arc;
use tower::ServiceExt;

const SECRET: &str = "test-secret";

async fn state_with_store(kv: Arc<dyn KvStore>) -> AppState {
    let db = Database::in_memory().await.unwrap();
    let sessions = Arc::new(SessionIssuer::new(SECRET, Duration::hours(1)));
    AppState::new(db, kv, sessions, std::time::Duration::from_millis(300))
}

async fn test_state() -> AppState {
    state_with_store(Arc::new(MemoryStore::new())).await
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Vec<u8>) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, body.to_vec())
}

fn get(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::empty()).unwrap()
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn parse<T: DeserializeOwned>(body: &[u8]) -> T {
    serde_json::from_slice(body).unwrap()
}

async fn register(app: &Router, email: &str, password: &str) -> UserResponse {
    let (status, body) = send(
        app,
        post_json(
            "/users",
            json!({"email": email, "name": "A", "password": password}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    parse::<CreateUserResponse>(&body).user
}

async fn login(app: &Router, email: &str, password: &str) -> String {
    let (status, body) = send(
        app,
        post_json("/login", json!({"email": email, "password": password})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    parse::<LoginResponse>(&body).token
}

/// Cache double whose backend is down
struct UnreachableStore;

#[async_trait]
impl KvStore for UnreachableStore {
    async fn get(&self, _key: &str) -> Result<Option<String>, KvError> {
        Err(KvError::Unavailable("connection refused".to_string()))
    }

    async fn set(&self, _key: &str, _value: &str) -> Result<(), KvError> {
        Err(KvError::Unavailable("connection refused".to_string()))
    }

    async fn ping(&self) -> Result<(), KvError> {
        Err(KvError::Unavailable("connection refused".to_string()))
    }

    fn backend_name(&self) -> &'static str {
        "unreachable"
    }
}

/// Cache double that never answers in time
struct StalledStore;

#[async_trait]
impl KvStore for StalledStore {
    async fn get(&self, _key: &str) -> Result<Option<String>, KvError> {
        Ok(None)
    }

    async fn set(&self, _key: &str, _value: &str) -> Result<(), KvError> {
        Ok(())
    }

    async fn ping(&self) -> Result<(), KvError> {
        tokio::time::sleep(std::time::Duration::from_secs(5)).await;
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "stalled"
    }
}

// ==================== Registration ====================

#[tokio::test]
async fn test_register_returns_user_without_password() {
    let app = create_router(test_state().await, None);

    let (status, body) = send(
        &app,
        post_json(
            "/users",
            json!({"email": "a@b.com", "name": "A", "password": "pw123", "phone": "555-0100"}),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    let raw: Value = parse(&body);
    let user = &raw["user"];
    assert_eq!(user["email"], "a@b.com");
    assert_eq!(user["name"], "A");
    assert_eq!(user["phone"], "555-0100");
    assert_eq!(user["role"], "user");
    assert!(user["id"].as_i64().unwrap() > 0);
    assert!(user.get("password").is_none());
    assert!(user.get("password_hash").is_none());
    assert!(!String::from_utf8_lossy(&body).contains("argon2"));
}

#[tokio::test]
async fn test_duplicate_email_conflicts() {
    let app = create_router(test_state().await, None);
    register(&app, "a@b.com", "pw123").await;

    let (status, body) = send(
        &app,
        post_json(
            "/users",
            json!({"email": "a@b.com", "name": "B", "password": "other"}),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::CONFLICT);
    let raw: Value = parse(&body);
    assert!(raw["error"].is_string());
}

#[tokio::test]
async fn test_register_validates_input() {
    let app = create_router(test_state().await, None);

    for body in [
        json!({"email": "no-at-sign", "name": "A", "password": "pw123"}),
        json!({"email": "a@b.com", "name": "", "password": "pw123"}),
        json!({"email": "a@b.com", "name": "A", "password": ""}),
    ] {
        let (status, _) = send(&app, post_json("/users", body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}

#[tokio::test]
async fn test_register_ignores_requested_role() {
    let state = test_state().await;
    let sessions = state.sessions.clone();
    let app = create_router(state, None);

    let (status, body) = send(
        &app,
        post_json(
            "/users",
            json!({"email": "a@b.com", "name": "A", "password": "pw123", "role": "admin"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(parse::<CreateUserResponse>(&body).user.role, "user");

    let token = login(&app, "a@b.com", "pw123").await;
    assert_eq!(sessions.verify(&token).unwrap().role, Role::User);
}

// ==================== Malformed bodies ====================

fn post_raw(uri: &str, body: &'static str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body))
        .unwrap()
}

async fn assert_bad_request(app: &Router, request: Request<Body>) {
    let (status, body) = send(app, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let raw: Value = parse(&body);
    assert!(raw["error"].is_string(), "{}", raw);
}

#[tokio::test]
async fn test_missing_field_is_bad_request() {
    let app = create_router(test_state().await, None);

    for (uri, body) in [
        ("/login", json!({"email": "a@b.com"})),
        ("/users", json!({"email": "a@b.com", "password": "pw123"})),
        ("/cache", json!({"key": "k"})),
    ] {
        assert_bad_request(&app, post_json(uri, body)).await;
    }
}

#[tokio::test]
async fn test_unparseable_json_is_bad_request() {
    let app = create_router(test_state().await, None);

    for uri in ["/login", "/users", "/cache"] {
        assert_bad_request(&app, post_raw(uri, r#"{"email": "a@b.com","#)).await;
    }
}

#[tokio::test]
async fn test_wrong_field_type_is_bad_request() {
    let app = create_router(test_state().await, None);

    assert_bad_request(&app, post_json("/cache", json!({"key": "k", "value": 7}))).await;
}

// ==================== Login ====================

#[tokio::test]
async fn test_login_token_carries_id_and_role() {
    let state = test_state().await;
    let sessions = state.sessions.clone();
    let app = create_router(state, None);

    let user = register(&app, "a@b.com", "pw123").await;
    let token = login(&app, "a@b.com", "pw123").await;

    let claims = sessions.verify(&token).unwrap();
    assert_eq!(claims.id, user.id);
    assert_eq!(claims.role, Role::User);
}

#[tokio::test]
async fn test_login_reports_expiry() {
    let app = create_router(test_state().await, None);
    register(&app, "a@b.com", "pw123").await;

    let (_, body) = send(
        &app,
        post_json("/login", json!({"email": "a@b.com", "password": "pw123"})),
    )
    .await;
    assert_eq!(parse::<LoginResponse>(&body).expires_in, 3600);
}

#[tokio::test]
async fn test_login_wrong_password_is_unauthorized() {
    let app = create_router(test_state().await, None);
    register(&app, "a@b.com", "pw123").await;

    let (status, body) = send(
        &app,
        post_json("/login", json!({"email": "a@b.com", "password": "nope"})),
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(parse::<Value>(&body)["error"], "Invalid password");
}

#[tokio::test]
async fn test_login_unknown_email_is_not_found() {
    let app = create_router(test_state().await, None);

    let (status, body) = send(
        &app,
        post_json("/login", json!({"email": "ghost@b.com", "password": "pw123"})),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(parse::<Value>(&body)["error"], "User not found");
}

#[tokio::test]
async fn test_login_email_is_not_interpolated() {
    let app = create_router(test_state().await, None);
    register(&app, "a@b.com", "pw123").await;

    let (status, _) = send(
        &app,
        post_json(
            "/login",
            json!({"email": "x@y' OR '1'='1", "password": "pw123"}),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}

// ==================== Authenticated routes ====================

#[tokio::test]
async fn test_example_scenario() {
    let app = create_router(test_state().await, None);

    let user = register(&app, "a@b.com", "pw123").await;
    let token = login(&app, "a@b.com", "pw123").await;

    let (status, body) = send(&app, get(&format!("/users/{}", user.id), Some(&token))).await;
    assert_eq!(status, StatusCode::OK);
    let fetched: UserResponse = parse(&body);
    assert_eq!(fetched.email, "a@b.com");
    assert!(!String::from_utf8_lossy(&body).contains("password"));

    let (status, _) = send(&app, get(&format!("/users/{}", user.id), None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_me_resolves_caller_from_token() {
    let app = create_router(test_state().await, None);

    register(&app, "other@b.com", "pw123").await;
    let me = register(&app, "a@b.com", "pw123").await;
    let token = login(&app, "a@b.com", "pw123").await;

    let (status, body) = send(&app, get("/me", Some(&token))).await;
    assert_eq!(status, StatusCode::OK);
    let fetched: UserResponse = parse(&body);
    assert_eq!(fetched.id, me.id);
    assert_eq!(fetched.email, "a@b.com");

    let (status, _) = send(&app, get("/me", None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_unknown_user_id_is_not_found() {
    let app = create_router(test_state().await, None);
    register(&app, "a@b.com", "pw123").await;
    let token = login(&app, "a@b.com", "pw123").await;

    let (status, _) = send(&app, get("/users/9999", Some(&token))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_tampered_and_expired_tokens_are_rejected() {
    let app = create_router(test_state().await, None);
    let user = register(&app, "a@b.com", "pw123").await;
    let token = login(&app, "a@b.com", "pw123").await;

    let mut parts: Vec<String> = token.split('.').map(str::to_string).collect();
    let signature = parts[2].clone();
    let flipped = if signature.starts_with('A') { "B" } else { "A" };
    parts[2] = format!("{}{}", flipped, &signature[1..]);
    let tampered = parts.join(".");

    let forged = SessionIssuer::new("not-the-secret", Duration::hours(1))
        .issue(user.id, Role::Admin)
        .unwrap();
    let expired = SessionIssuer::new(SECRET, Duration::seconds(-30))
        .issue(user.id, Role::User)
        .unwrap();

    for bad in [tampered, forged, expired, "garbage".to_string()] {
        let (status, _) = send(&app, get(&format!("/users/{}", user.id), Some(&bad))).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }
}

#[tokio::test]
async fn test_rejected_token_never_reaches_store() {
    let state = test_state().await;
    let db = state.db.clone();
    let app = create_router(state, None);

    // A lookup against the closed pool would answer 503, not 401.
    db.close().await;

    let (status, _) = send(&app, get("/users/1", None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(&app, get("/me", Some("garbage"))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_store_outage_surfaces_as_unavailable() {
    let state = test_state().await;
    let db = state.db.clone();
    let sessions = state.sessions.clone();
    let app = create_router(state, None);

    db.close().await;
    let token = sessions.issue(1, Role::User).unwrap();

    let (status, _) = send(&app, get("/users/1", Some(&token))).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_non_numeric_user_id_is_bad_request() {
    let app = create_router(test_state().await, None);
    register(&app, "a@b.com", "pw123").await;
    let token = login(&app, "a@b.com", "pw123").await;

    assert_bad_request(&app, get("/users/abc", Some(&token))).await;
}

// ==================== Cache ====================

#[tokio::test]
async fn test_cache_set_then_get() {
    let app = create_router(test_state().await, None);

    let (status, body) = send(
        &app,
        post_json("/cache", json!({"key": "greeting", "value": "hello"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let written: CacheEntryResponse = parse(&body);
    assert_eq!(written.value.as_deref(), Some("hello"));

    let (status, body) = send(&app, get("/cache/greeting", None)).await;
    assert_eq!(status, StatusCode::OK);
    let read: CacheEntryResponse = parse(&body);
    assert_eq!(read.key, "greeting");
    assert_eq!(read.value.as_deref(), Some("hello"));
}

#[tokio::test]
async fn test_cache_get_missing_key_is_null() {
    let app = create_router(test_state().await, None);

    let (status, body) = send(&app, get("/cache/never-set", None)).await;
    assert_eq!(status, StatusCode::OK);
    let raw: Value = parse(&body);
    assert_eq!(raw["key"], "never-set");
    assert!(raw["value"].is_null());
}

#[tokio::test]
async fn test_cache_overwrites() {
    let app = create_router(test_state().await, None);

    send(&app, post_json("/cache", json!({"key": "k", "value": "one"}))).await;
    send(&app, post_json("/cache", json!({"key": "k", "value": "two"}))).await;

    let (_, body) = send(&app, get("/cache/k", None)).await;
    assert_eq!(parse::<CacheEntryResponse>(&body).value.as_deref(), Some("two"));
}

#[tokio::test]
async fn test_cache_outage_is_unavailable() {
    let app = create_router(state_with_store(Arc::new(UnreachableStore)).await, None);

    let (status, _) = send(&app, post_json("/cache", json!({"key": "k", "value": "v"}))).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);

    let (status, _) = send(&app, get("/cache/k", None)).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_cache_key_is_passed_through_untrimmed() {
    let app = create_router(test_state().await, None);

    let (status, _) = send(&app, post_json("/cache", json!({"key": " ", "value": "space"}))).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = send(&app, get("/cache/%20", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(parse::<CacheEntryResponse>(&body).value.as_deref(), Some("space"));
}

// ==================== Health ====================

#[tokio::test]
async fn test_health_ok_when_dependencies_answer() {
    let app = create_router(test_state().await, None);

    let (status, body) = send(&app, get("/health", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, b"OK");
}

#[tokio::test]
async fn test_health_degrades_when_cache_is_down() {
    let app = create_router(state_with_store(Arc::new(UnreachableStore)).await, None);

    let (status, body) = send(&app, get("/health", None)).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, b"NOT_OK");
}

#[tokio::test]
async fn test_health_degrades_when_cache_stalls() {
    let app = create_router(state_with_store(Arc::new(StalledStore)).await, None);

    let (status, body) = send(&app, get("/health", None)).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, b"NOT_OK");
}

#[tokio::test]
async fn test_health_degrades_when_database_is_down() {
    let state = test_state().await;
    let db = state.db.clone();
    let app = create_router(state, None);
    db.close().await;

    let (status, body) = send(&app, get("/health", None)).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, b"NOT_OK");
}

#[tokio::test]
async fn test_heartbeat_skips_dependencies() {
    let app = create_router(state_with_store(Arc::new(UnreachableStore)).await, None);

    let (status, body) = send(&app, get("/heartbeat", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, b"OK");
}


// ==================== Metrics ====================

#[tokio::test]
async fn test_metrics_served_only_when_enabled() {
    let recorder = PrometheusBuilder::new().build_recorder();
    let handle = recorder.handle();
    metrics::with_local_recorder(&recorder, || {
        metrics::counter!("gatehouse_logins_total", "outcome" => "success").increment(1);
    });

    let app = create_router(test_state().await, Some(handle));
    let (status, body) = send(&app, get("/metrics", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(String::from_utf8_lossy(&body).contains("gatehouse_logins_total"));

    let app = create_router(test_state().await, None);
    let (status, _) = send(&app, get("/metrics", None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
