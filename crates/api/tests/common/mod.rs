#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Method, Request, Response};
use axum::Router;
use chrono::{TimeZone, Utc};
use http_body_util::BodyExt;
use lingua_core::advancement::AdvancementPolicy;
use lingua_core::clock::FixedClock;
use lingua_core::types::Timestamp;
use sqlx::PgPool;
use tower::ServiceExt;

use lingua_api::config::ServerConfig;
use lingua_api::router::build_app_router;
use lingua_api::state::AppState;

/// Instant every test app reports as "now" unless built with
/// [`build_test_app_at`].
pub fn test_now() -> Timestamp {
    Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()
}

/// Build a test `ServerConfig` with safe defaults.
///
/// Uses `http://localhost:5173` as CORS origin (matching the dev default),
/// a 30-second request timeout and the default advancement policy.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        policy: AdvancementPolicy::default(),
    }
}

/// Build the full application router, using the given database pool and a
/// clock frozen at [`test_now`].
///
/// Goes through `build_app_router` so integration tests exercise the same
/// middleware stack (CORS, request ID, timeout, tracing, panic recovery)
/// that production uses.
pub fn build_test_app(pool: PgPool) -> Router {
    build_test_app_at(pool, test_now())
}

/// Like [`build_test_app`] with the clock frozen at `now`.
pub fn build_test_app_at(pool: PgPool, now: Timestamp) -> Router {
    let config = test_config();
    let state = AppState {
        pool,
        policy: Arc::new(config.policy.clone()),
        clock: Arc::new(FixedClock(now)),
    };
    build_app_router(state, &config)
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    let request = Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn post(app: Router, uri: &str) -> Response<Body> {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// Register a learner through the API and return its id.
pub async fn create_learner(pool: &PgPool, body: serde_json::Value) -> i64 {
    let response = post_json(build_test_app(pool.clone()), "/api/v1/learners", body).await;
    assert_eq!(response.status(), axum::http::StatusCode::CREATED);
    body_json(response).await["data"]["id"].as_i64().unwrap()
}

/// Post `count` activities for one module.
pub async fn practice(
    pool: &PgPool,
    id: i64,
    module: &str,
    count: usize,
    body: serde_json::Value,
) {
    let uri = format!("/api/v1/learners/{id}/progress/modules/{module}/activity");
    for _ in 0..count {
        let response = post_json(build_test_app(pool.clone()), &uri, body.clone()).await;
        assert_eq!(response.status(), axum::http::StatusCode::OK);
    }
}
