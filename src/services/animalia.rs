// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Animalia SSO client: authorization URL building, code exchange, and
//! identity-claim extraction.
//!
//! All endpoints and credentials are injected at construction so the flow
//! can be pointed at a fake provider in tests.

use crate::config::Config;
use crate::error::AppError;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use ring::rand::{SecureRandom, SystemRandom};
use serde::Deserialize;

/// Outbound SSO calls are bounded; a hung provider surfaces as ExchangeFailed.
const EXCHANGE_TIMEOUT_SECS: u64 = 10;

/// Pending login states expire after this many minutes.
const LOGIN_STATE_TTL_MINS: i64 = 10;

/// OAuth scope requested from Animalia. `pid` carries the farmer ID.
const OAUTH_SCOPE: &str = "openid profile email offline_access pid";

// ─────────────────────────────────────────────────────────────────────────────
// Login state store (CSRF defense)
// ─────────────────────────────────────────────────────────────────────────────

/// Server-held random state values correlating an authorization redirect
/// with its callback. Each value is consumed at most once.
pub struct LoginStateStore {
    rng: SystemRandom,
    pending: DashMap<String, DateTime<Utc>>,
}

impl LoginStateStore {
    pub fn new() -> Self {
        Self {
            rng: SystemRandom::new(),
            pending: DashMap::new(),
        }
    }

    /// Generate and register a fresh state value for a new login attempt.
    pub fn issue(&self) -> Result<String, AppError> {
        // Drop stale entries so abandoned logins don't accumulate.
        let cutoff = Utc::now() - Duration::minutes(LOGIN_STATE_TTL_MINS);
        self.pending.retain(|_, created| *created > cutoff);

        let mut bytes = [0u8; 32];
        self.rng
            .fill(&mut bytes)
            .map_err(|_| AppError::Internal(anyhow::anyhow!("System RNG failure")))?;

        let state = URL_SAFE_NO_PAD.encode(bytes);
        self.pending.insert(state.clone(), Utc::now());
        Ok(state)
    }

    /// Compare-and-clear a returned state value. The removal is atomic, so
    /// a replayed callback always fails even under concurrent requests.
    pub fn consume(&self, state: &str) -> Result<(), AppError> {
        let (_, created) = self.pending.remove(state).ok_or(AppError::InvalidState)?;

        if Utc::now() - created > Duration::minutes(LOGIN_STATE_TTL_MINS) {
            return Err(AppError::InvalidState);
        }
        Ok(())
    }

    /// Number of logins currently awaiting their callback.
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }
}

impl Default for LoginStateStore {
    fn default() -> Self {
        Self::new()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Animalia SSO client
// ─────────────────────────────────────────────────────────────────────────────

/// Animalia SSO client with OAuth credentials and endpoints.
#[derive(Clone)]
pub struct AnimaliaService {
    http: reqwest::Client,
    authorize_url: String,
    token_url: String,
    logout_url: String,
    client_id: String,
    client_secret: String,
    redirect_uri: String,
}

impl AnimaliaService {
    /// Create a new SSO client from application config.
    pub fn new(config: &Config) -> Self {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(EXCHANGE_TIMEOUT_SECS))
            .build()
            .expect("Failed to build HTTP client");

        Self {
            http,
            authorize_url: format!("{}/authorize", config.sso_base_url),
            token_url: format!("{}/token", config.sso_base_url),
            logout_url: format!("{}/logout", config.sso_base_url),
            client_id: config.animalia_client_id.clone(),
            client_secret: config.animalia_client_secret.clone(),
            redirect_uri: config.redirect_uri.clone(),
        }
    }

    /// Register a fresh state value and build the authorization URL the
    /// browser is sent to.
    pub fn begin_login(&self, states: &LoginStateStore) -> Result<String, AppError> {
        let state = states.issue()?;
        Ok(self.authorization_url(&state))
    }

    /// Build the provider authorization URL for a given state value.
    pub fn authorization_url(&self, state: &str) -> String {
        format!(
            "{}?redirect_uri={}&client_id={}&auto_login=true&scope={}&state={}",
            self.authorize_url,
            urlencoding::encode(&self.redirect_uri),
            urlencoding::encode(&self.client_id),
            urlencoding::encode(OAUTH_SCOPE),
            state
        )
    }

    /// Handle the provider callback: verify and consume the state, exchange
    /// the code, and extract the identity claim.
    ///
    /// The state is consumed exactly once; replaying a callback fails with
    /// InvalidState no matter how the first attempt ended.
    pub async fn complete_login(
        &self,
        states: &LoginStateStore,
        returned_state: &str,
        code: Option<&str>,
        provider_error: Option<&str>,
    ) -> Result<IdentityClaim, AppError> {
        states.consume(returned_state)?;

        let code = match code {
            Some(c) if !c.is_empty() => c,
            _ => {
                let reason = provider_error.unwrap_or("no authorization code").to_string();
                tracing::warn!(error = %reason, "OAuth callback without authorization code");
                return Err(AppError::MissingCode(reason));
            }
        };

        let token_response = self.exchange_code(code).await?;

        let id_token = token_response
            .id_token
            .ok_or_else(|| AppError::ExchangeFailed("no id_token in token response".to_string()))?;

        extract_claim(&id_token)
    }

    /// Exchange an authorization code for tokens at the provider.
    async fn exchange_code(&self, code: &str) -> Result<TokenExchangeResponse, AppError> {
        let response = self
            .http
            .post(&self.token_url)
            .header(reqwest::header::ACCEPT, "application/json")
            .form(&[
                ("grant_type", "authorization_code"),
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("code", code),
                ("redirect_uri", self.redirect_uri.as_str()),
            ])
            .send()
            .await
            .map_err(|e| AppError::ExchangeFailed(format!("Token exchange request failed: {}", e)))?;

        // Animalia returns 201 Created on success, so accept any 2xx.
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, body = %body, "Animalia token exchange failed");
            return Err(AppError::ExchangeFailed(format!(
                "Token exchange failed with status {}",
                status
            )));
        }

        response
            .json()
            .await
            .map_err(|e| AppError::ExchangeFailed(format!("Failed to parse token response: {}", e)))
    }

    /// Build the SSO logout URL, optionally redirecting back afterwards.
    pub fn sso_logout_url(&self, redirect_uri: Option<&str>) -> String {
        match redirect_uri {
            Some(uri) => format!("{}?redirect_uri={}", self.logout_url, urlencoding::encode(uri)),
            None => self.logout_url.clone(),
        }
    }
}

/// Token exchange response from the Animalia token endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenExchangeResponse {
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub id_token: Option<String>,
}

/// Identity attributes asserted by the provider after token exchange.
#[derive(Debug, Clone)]
pub struct IdentityClaim {
    /// Provider subject (`sub`)
    pub subject: Option<String>,
    /// Email address, always present
    pub email: String,
    /// Farmer ID (`pid`), always present
    pub farmer_id: String,
    /// Display name, may be empty
    pub full_name: String,
}

/// Payload fields we read out of the provider id_token.
#[derive(Deserialize)]
struct IdTokenPayload {
    #[serde(default)]
    sub: Option<serde_json::Value>,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    pid: Option<serde_json::Value>,
    #[serde(default)]
    name: Option<String>,
}

/// Extract the identity claim from a provider id_token.
///
/// The id_token comes straight from the token endpoint response over TLS,
/// not from the client, so only its payload is read here. Email and farmer
/// ID are an authorization boundary: without both, the login is rejected.
pub fn extract_claim(id_token: &str) -> Result<IdentityClaim, AppError> {
    let mut parts = id_token.split('.');
    let (_header, payload) = match (parts.next(), parts.next(), parts.next(), parts.next()) {
        (Some(h), Some(p), Some(_sig), None) => (h, p),
        _ => return Err(AppError::ExchangeFailed("malformed id_token".to_string())),
    };

    let decoded = URL_SAFE_NO_PAD
        .decode(payload)
        .map_err(|_| AppError::ExchangeFailed("malformed id_token payload".to_string()))?;

    let payload: IdTokenPayload = serde_json::from_slice(&decoded)
        .map_err(|_| AppError::ExchangeFailed("unparseable id_token payload".to_string()))?;

    let email = match payload.email {
        Some(e) if !e.trim().is_empty() => e,
        _ => return Err(AppError::IncompleteClaim),
    };
    let farmer_id = claim_value_to_string(payload.pid).ok_or(AppError::IncompleteClaim)?;

    Ok(IdentityClaim {
        subject: claim_value_to_string(payload.sub),
        email,
        farmer_id,
        full_name: payload.name.unwrap_or_default(),
    })
}

/// Providers serialize some claims as either strings or numbers.
fn claim_value_to_string(value: Option<serde_json::Value>) -> Option<String> {
    match value {
        Some(serde_json::Value::String(s)) => Some(s),
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_service() -> AnimaliaService {
        AnimaliaService::new(&Config::test_default())
    }

    fn make_id_token(payload: serde_json::Value) -> String {
        let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"RS256","typ":"JWT"}"#);
        let body = URL_SAFE_NO_PAD.encode(payload.to_string().as_bytes());
        format!("{}.{}.signature", header, body)
    }

    #[test]
    fn test_authorization_url_contains_params() {
        let service = test_service();
        let url = service.authorization_url("abc123");

        assert!(url.starts_with("https://staging-sso.animalia.no/authorize?"));
        assert!(url.contains("client_id=test_client_id"));
        assert!(url.contains("state=abc123"));
        assert!(url.contains("auto_login=true"));
        assert!(url.contains(&format!("scope={}", urlencoding::encode(OAUTH_SCOPE))));
    }

    #[test]
    fn test_extract_claim_complete() {
        let token = make_id_token(serde_json::json!({
            "sub": "u-123",
            "email": "farmer@example.no",
            "pid": "F1A2B3C4",
            "name": "Kari Nordmann",
        }));

        let claim = extract_claim(&token).unwrap();
        assert_eq!(claim.email, "farmer@example.no");
        assert_eq!(claim.farmer_id, "F1A2B3C4");
        assert_eq!(claim.full_name, "Kari Nordmann");
        assert_eq!(claim.subject.as_deref(), Some("u-123"));
    }

    #[test]
    fn test_extract_claim_numeric_pid() {
        let token = make_id_token(serde_json::json!({
            "email": "farmer@example.no",
            "pid": 991234,
        }));

        let claim = extract_claim(&token).unwrap();
        assert_eq!(claim.farmer_id, "991234");
    }

    #[test]
    fn test_extract_claim_missing_email_rejected() {
        let token = make_id_token(serde_json::json!({
            "sub": "u-123",
            "pid": "F1A2B3C4",
        }));

        let err = extract_claim(&token).unwrap_err();
        assert!(matches!(err, AppError::IncompleteClaim));
    }

    #[test]
    fn test_extract_claim_missing_pid_rejected() {
        let token = make_id_token(serde_json::json!({
            "email": "farmer@example.no",
        }));

        let err = extract_claim(&token).unwrap_err();
        assert!(matches!(err, AppError::IncompleteClaim));
    }

    #[test]
    fn test_extract_claim_malformed_token() {
        let err = extract_claim("only-one-part").unwrap_err();
        assert!(matches!(err, AppError::ExchangeFailed(_)));
    }

    #[test]
    fn test_state_consumed_exactly_once() {
        let states = LoginStateStore::new();
        let state = states.issue().unwrap();

        assert!(states.consume(&state).is_ok());
        assert!(matches!(
            states.consume(&state),
            Err(AppError::InvalidState)
        ));
    }

    #[test]
    fn test_unknown_state_rejected() {
        let states = LoginStateStore::new();
        assert!(matches!(
            states.consume("never-issued"),
            Err(AppError::InvalidState)
        ));
        assert!(matches!(states.consume(""), Err(AppError::InvalidState)));
    }

    #[test]
    fn test_issued_states_are_distinct() {
        let states = LoginStateStore::new();
        let a = states.issue().unwrap();
        let b = states.issue().unwrap();
        assert_ne!(a, b);
        assert_eq!(states.pending_count(), 2);
    }
}
