//! Common test utilities for integration tests
//!
//! Builds the real router over in-memory store and cache fakes, with a cheap
//! Argon2 work factor, and provides request helpers.

#![allow(dead_code)]

use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::Value;
use std::sync::Arc;
use tessera_api::app::{build_router, AppState};
use tessera_api::config::Config;
use tessera_shared::auth::jwt::{Identity, TokenService};
use tessera_shared::auth::password::HashParams;
use tessera_shared::cache::InMemoryProfileCache;
use tessera_shared::store::InMemoryUserStore;
use tower::Service as _;

pub const SECRET: &str = "integration-test-secret-at-least-32-bytes";

/// Test context containing the app and handles to its backends
pub struct TestContext {
    pub app: axum::Router,
    pub users: Arc<InMemoryUserStore>,
    pub cache: Arc<InMemoryProfileCache>,
    pub tokens: Arc<TokenService>,
}

impl TestContext {
    /// Creates a context with default settings
    pub fn new() -> Self {
        Self::with_vars(&[])
    }

    /// Creates a context with extra configuration variables
    pub fn with_vars(extra: &[(&str, &str)]) -> Self {
        Self::build(extra, HashParams::fast())
    }

    /// Creates a context whose hasher uses `password` work factors
    pub fn with_hash_params(password: HashParams) -> Self {
        Self::build(&[], password)
    }

    fn build(extra: &[(&str, &str)], password: HashParams) -> Self {
        let mut vars: Vec<(String, String)> = vec![
            ("DATABASE_URL".into(), "postgresql://unused/test".into()),
            ("JWT_SECRET".into(), SECRET.into()),
        ];
        vars.extend(extra.iter().map(|(k, v)| (k.to_string(), v.to_string())));

        let lookup = |name: &str| {
            vars.iter()
                .rev()
                .find(|(key, _)| key == name)
                .map(|(_, value)| value.clone())
        };
        let mut config = Config::from_lookup(lookup).unwrap();
        config.password = password;

        let users = Arc::new(InMemoryUserStore::new());
        let cache = Arc::new(InMemoryProfileCache::new());
        let state = AppState::new(config, users.clone(), cache.clone()).unwrap();
        let tokens = state.tokens.clone();

        TestContext {
            app: build_router(state),
            users,
            cache,
            tokens,
        }
    }

    /// Sends a request and returns the status and JSON body (`Null` if empty)
    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.app.clone().call(request).await.unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = if body.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body).unwrap()
        };
        (status, json)
    }

    pub async fn register(&self, email: &str, password: &str) -> (StatusCode, Value) {
        self.send(json_request(
            "POST",
            "/register",
            None,
            serde_json::json!({
                "first_name": "Ada",
                "last_name": "Lovelace",
                "email": email,
                "password": password,
            }),
        ))
        .await
    }

    pub async fn login(&self, email: &str, password: &str) -> (StatusCode, Value) {
        self.send(json_request(
            "POST",
            "/login",
            None,
            serde_json::json!({ "email": email, "password": password }),
        ))
        .await
    }

    /// Registers and logs in, returning the bearer token
    pub async fn signed_in(&self, email: &str, password: &str) -> String {
        let (status, _) = self.register(email, password).await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, body) = self.login(email, password).await;
        assert_eq!(status, StatusCode::OK);
        body["access_token"].as_str().unwrap().to_string()
    }

    pub async fn update(&self, token: &str, body: Value) -> (StatusCode, Value) {
        self.send(json_request("PUT", "/update", Some(token), body)).await
    }

    pub async fn profile(&self, token: Option<&str>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method("GET").uri("/profile");
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {}", token));
        }
        self.send(builder.body(Body::empty()).unwrap()).await
    }

    /// Issues a token for `user_id` directly, bypassing login
    pub fn token_for(&self, user_id: i64, email: &str) -> String {
        self.tokens.issue(&Identity::new(email, user_id), 30).unwrap()
    }
}

/// Builds a JSON request, optionally with a bearer token
pub fn json_request(method: &str, uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {}", token));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}
