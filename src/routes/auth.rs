// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Animalia SSO authentication routes.

use axum::{
    extract::{Query, State},
    response::Redirect,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use crate::error::{AppError, Result};
use crate::middleware::auth::create_jwt;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/auth/oauth/login", get(oauth_login))
        .route("/api/auth/oauth/callback", get(oauth_callback))
        .route("/api/auth/logout", post(logout))
}

/// Response for starting a login.
#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct LoginResponse {
    pub auth_url: String,
}

/// Start the OAuth flow - hand the frontend the provider authorization URL.
async fn oauth_login(State(state): State<Arc<AppState>>) -> Result<Json<LoginResponse>> {
    let auth_url = state.animalia.begin_login(&state.login_states)?;

    tracing::info!(
        pending_logins = state.login_states.pending_count(),
        "Starting OAuth login"
    );

    Ok(Json(LoginResponse { auth_url }))
}

#[derive(Deserialize)]
pub struct CallbackParams {
    #[serde(default)]
    state: Option<String>,
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// OAuth callback - exchange the code, resolve the account, issue a session.
async fn oauth_callback(
    State(app): State<Arc<AppState>>,
    Query(params): Query<CallbackParams>,
) -> Result<Redirect> {
    let claim = app
        .animalia
        .complete_login(
            &app.login_states,
            params.state.as_deref().unwrap_or(""),
            params.code.as_deref(),
            params.error.as_deref(),
        )
        .await?;

    let user = app.users.resolve_or_create(&claim).await?;

    tracing::info!(
        farmer_id = %user.farmer_id,
        "OAuth login successful, session issued"
    );

    let token = create_jwt(&user, &app.config.jwt_signing_key)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("JWT creation failed: {}", e)))?;

    // Hand the session token to the frontend via redirect.
    let redirect_url = format!("{}/auth/callback?token={}", app.config.frontend_url, token);

    Ok(Redirect::temporary(&redirect_url))
}

#[derive(Deserialize, Default)]
pub struct LogoutRequest {
    #[serde(default)]
    sso_logout: Option<bool>,
}

/// Response for logout.
#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct LogoutResponse {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sso_logout_url: Option<String>,
    pub redirect_to_sso: bool,
}

/// Logout. Sessions are stateless, so the token simply ages out client-side;
/// optionally hand back the SSO logout URL for a full provider logout.
async fn logout(
    State(app): State<Arc<AppState>>,
    body: Option<Json<LogoutRequest>>,
) -> Json<LogoutResponse> {
    let sso_logout = body
        .and_then(|Json(req)| req.sso_logout)
        .unwrap_or(true);

    if sso_logout {
        let back_to_login = format!("{}/login", app.config.frontend_url);
        Json(LogoutResponse {
            message: "Logout successful".to_string(),
            sso_logout_url: Some(app.animalia.sso_logout_url(Some(&back_to_login))),
            redirect_to_sso: true,
        })
    } else {
        Json(LogoutResponse {
            message: "Local logout successful".to_string(),
            sso_logout_url: None,
            redirect_to_sso: false,
        })
    }
}
