//! Shared helpers for the HTTP-level tests

#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Request, Response, StatusCode},
    Router,
};
use chrono::Duration;
use serde_json::{json, Value};
use tower::ServiceExt;

use authkeep_server::auth::{AuthService, PasswordHasher, TokenSigner};
use authkeep_server::config::RefreshRotation;
use authkeep_server::routes;
use authkeep_server::state::AppState;
use authkeep_server::store::{InMemorySessionStore, InMemoryUserStore};

pub const TEST_SECRET: &str = "integration-test-secret";

pub struct TestApp {
    pub router: Router,
    pub sessions: InMemorySessionStore,
}

/// Build the full router over in-memory stores
pub fn test_app(rotation: RefreshRotation) -> TestApp {
    test_app_with_refresh_ttl(rotation, Duration::days(14))
}

pub fn test_app_with_refresh_ttl(rotation: RefreshRotation, refresh_ttl: Duration) -> TestApp {
    let sessions = InMemorySessionStore::new();
    let auth_service = AuthService::new(
        Arc::new(InMemoryUserStore::new()),
        Arc::new(sessions.clone()),
        // Minimum bcrypt cost keeps the tests fast
        PasswordHasher::new(4),
        TokenSigner::new(TEST_SECRET, TokenSigner::DEFAULT_TTL_SECONDS),
        refresh_ttl,
        rotation,
    );

    TestApp {
        router: routes::app(AppState::new(Arc::new(auth_service)), None, false),
        sessions,
    }
}

pub fn registration(username: &str) -> Value {
    json!({
        "username": username,
        "password": "wonderland",
        "email": format!("{}@example.com", username),
        "firstName": "Alice",
        "lastName": "Liddell",
    })
}

pub fn post_json(uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .method("POST")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn post_with_cookie(uri: &str, refresh_token: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .method("POST")
        .header(header::COOKIE, format!("refreshToken={}", refresh_token))
        .body(Body::empty())
        .unwrap()
}

pub fn get_with_bearer(uri: &str, access_token: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .method("GET")
        .header(header::AUTHORIZATION, format!("Bearer {}", access_token))
        .body(Body::empty())
        .unwrap()
}

pub async fn send(router: &Router, request: Request<Body>) -> Response<Body> {
    router.clone().oneshot(request).await.unwrap()
}

pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec()
}

pub async fn body_json(response: Response<Body>) -> Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

/// The raw Set-Cookie header for the refresh token, if the response set one
pub fn refresh_set_cookie<B>(response: &Response<B>) -> Option<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find(|v| v.starts_with("refreshToken="))
        .map(str::to_string)
}

/// The refresh token value carried by a Set-Cookie header
pub fn refresh_token_value(set_cookie: &str) -> String {
    set_cookie
        .trim_start_matches("refreshToken=")
        .split(';')
        .next()
        .unwrap_or_default()
        .to_string()
}

/// Register `username` and sign in, returning (access token, refresh token)
pub async fn register_and_sign_in(router: &Router, username: &str) -> (String, String) {
    let response = send(router, post_json("/auth/signup", &registration(username))).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = send(
        router,
        post_json(
            "/auth/signin",
            &json!({"username": username, "password": "wonderland"}),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let set_cookie = refresh_set_cookie(&response).expect("refresh cookie");
    let body = body_json(response).await;

    (
        body["accessToken"].as_str().unwrap().to_string(),
        refresh_token_value(&set_cookie),
    )
}
