#![allow(dead_code)]

use std::sync::Arc;

use awardfare_api::auth::jwt::{generate_access_token, JwtConfig};
use awardfare_api::config::ServerConfig;
use awardfare_api::router::build_app_router;
use awardfare_api::state::AppState;
use awardfare_core::catalog::InMemoryCatalog;
use awardfare_core::engine::{AggregationEngine, EngineConfig};
use awardfare_core::testkit::{
    MemoryFlightStore, MemorySearchHistory, MemoryUsageStore, ScriptedCache,
};
use awardfare_core::usage::{UsageGate, UsagePolicy};
use axum::body::Body;
use axum::http::{Request, Response};
use axum::Router;
use chrono::{Days, NaiveDate, Utc};
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

pub const TEST_JWT_SECRET: &str = "test-secret-that-is-long-enough-for-hmac";

/// Build a test `ServerConfig` with safe defaults and bearer auth enabled.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:3000".to_string()],
        request_timeout_secs: 30,
        redis_url: None,
        cache_timeout_ms: 250,
        repository_timeout_ms: 5000,
        jwt: Some(JwtConfig {
            secret: TEST_JWT_SECRET.to_string(),
            access_token_expiry_mins: 15,
        }),
        purge_interval_secs: 3600,
    }
}

/// The router plus handles on its in-memory collaborators.
pub struct TestApp {
    pub router: Router,
    pub flights: Arc<MemoryFlightStore>,
    pub cache: Arc<ScriptedCache>,
    pub usage: Arc<MemoryUsageStore>,
    pub history: Arc<MemorySearchHistory>,
}

/// Build the full application router over in-memory collaborators, with the
/// same middleware stack production uses.
pub fn build_test_app() -> TestApp {
    let config = test_config();
    let flights = Arc::new(MemoryFlightStore::default());
    let cache = Arc::new(ScriptedCache::default());
    let usage = Arc::new(MemoryUsageStore::default());
    let history = Arc::new(MemorySearchHistory::default());

    let engine = AggregationEngine::new(
        flights.clone(),
        flights.clone(),
        cache.clone(),
        Arc::new(InMemoryCatalog::seeded()),
        EngineConfig::default(),
    );

    let state = AppState {
        config: Arc::new(config.clone()),
        engine: Arc::new(engine),
        usage: Arc::new(UsageGate::new(usage.clone(), UsagePolicy::default())),
        history: history.clone(),
    };

    TestApp {
        router: build_app_router(state, &config),
        flights,
        cache,
        usage,
        history,
    }
}

/// A bearer token for `user_id` on `tier`, signed with the test secret.
pub fn bearer(user_id: i64, tier: &str) -> String {
    let config = JwtConfig {
        secret: TEST_JWT_SECRET.to_string(),
        access_token_expiry_mins: 15,
    };
    let token = generate_access_token(user_id, tier, &config).expect("token should sign");
    format!("Bearer {token}")
}

/// Today plus `days`, in UTC.
pub fn days_from_today(days: u64) -> NaiveDate {
    Utc::now()
        .date_naive()
        .checked_add_days(Days::new(days))
        .expect("date in range")
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    app.oneshot(request).await.unwrap()
}

/// POST a JSON body from the given client IP, optionally with an
/// `Authorization` header value.
pub async fn post_json(
    app: Router,
    uri: &str,
    body: Value,
    ip: &str,
    authorization: Option<&str>,
) -> Response<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .header("x-forwarded-for", ip);
    if let Some(value) = authorization {
        builder = builder.header("authorization", value);
    }
    let request = builder.body(Body::from(body.to_string())).unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
