// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! OAuth login-state lifecycle tests.
//!
//! These tests drive the login-start and callback routes to verify that a
//! state value is accepted at most once, and that callback failures consume
//! the state just like successes do.

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use tower::ServiceExt;

mod common;

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

/// Start a login and pull the state parameter out of the authorization URL.
async fn start_login(app: &axum::Router) -> String {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/api/auth/oauth/login")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    let auth_url = body["auth_url"].as_str().expect("auth_url in response");

    let (_, state) = auth_url
        .split_once("state=")
        .expect("state param in auth_url");
    state
        .split('&')
        .next()
        .unwrap()
        .to_string()
}

async fn callback(app: &axum::Router, query: &str) -> axum::response::Response {
    app.clone()
        .oneshot(
            Request::builder()
                .method("GET")
                .uri(format!("/api/auth/oauth/callback?{}", query))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap()
}

#[tokio::test]
async fn test_login_start_returns_auth_url() {
    let (app, state) = common::create_test_app();

    let oauth_state = start_login(&app).await;
    assert!(!oauth_state.is_empty());
    assert_eq!(state.login_states.pending_count(), 1);
}

#[tokio::test]
async fn test_callback_with_unknown_state_rejected() {
    let (app, _) = common::create_test_app();

    let response = callback(&app, "state=never-issued&code=abc").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = body_json(response).await;
    assert_eq!(body["error"], "invalid_state");
}

#[tokio::test]
async fn test_callback_without_state_rejected() {
    let (app, _) = common::create_test_app();

    let response = callback(&app, "code=abc").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = body_json(response).await;
    assert_eq!(body["error"], "invalid_state");
}

#[tokio::test]
async fn test_state_consumed_by_failed_callback() {
    let (app, _) = common::create_test_app();
    let oauth_state = start_login(&app).await;

    // First callback carries no code: rejected, but the state is spent.
    let response = callback(&app, &format!("state={}", oauth_state)).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"], "missing_code");

    // Replaying the same state must now fail as invalid.
    let response = callback(&app, &format!("state={}&code=abc", oauth_state)).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"], "invalid_state");
}

#[tokio::test]
async fn test_provider_error_surfaced_in_missing_code() {
    let (app, _) = common::create_test_app();
    let oauth_state = start_login(&app).await;

    let response = callback(
        &app,
        &format!("state={}&error=access_denied", oauth_state),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = body_json(response).await;
    assert_eq!(body["error"], "missing_code");
    assert_eq!(body["details"], "access_denied");
}

#[tokio::test]
async fn test_concurrent_logins_get_distinct_states() {
    let (app, state) = common::create_test_app();

    let a = start_login(&app).await;
    let b = start_login(&app).await;

    assert_ne!(a, b);
    assert_eq!(state.login_states.pending_count(), 2);
}
