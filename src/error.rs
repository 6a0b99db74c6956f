// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application error types with consistent API responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Application error type that converts to HTTP responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Authentication required")]
    Unauthorized,

    #[error("Session token expired")]
    TokenExpired,

    #[error("Session token malformed")]
    TokenMalformed,

    #[error("Invalid or already-used OAuth state")]
    InvalidState,

    #[error("No authorization code in callback: {0}")]
    MissingCode(String),

    #[error("Token exchange with SSO failed: {0}")]
    ExchangeFailed(String),

    #[error("Identity token missing required user info")]
    IncompleteClaim,

    #[error("Image too large (max {0} bytes)")]
    TooLarge(usize),

    #[error("Unsupported image type")]
    UnsupportedType,

    #[error("Invalid weight: {0}")]
    InvalidWeight(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

/// JSON error response body
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error, details) = match &self {
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "unauthorized", None),
            // Expired and malformed tokens are indistinguishable to the
            // client; the distinction only exists in server logs.
            AppError::TokenExpired | AppError::TokenMalformed => {
                tracing::debug!(reason = %self, "Rejecting session token");
                (StatusCode::UNAUTHORIZED, "invalid_token", None)
            }
            AppError::InvalidState => (StatusCode::BAD_REQUEST, "invalid_state", None),
            AppError::MissingCode(msg) => {
                (StatusCode::BAD_REQUEST, "missing_code", Some(msg.clone()))
            }
            AppError::ExchangeFailed(msg) => {
                (StatusCode::BAD_GATEWAY, "exchange_failed", Some(msg.clone()))
            }
            AppError::IncompleteClaim => (
                StatusCode::FORBIDDEN,
                "incomplete_claim",
                Some("missing required user info".to_string()),
            ),
            AppError::TooLarge(limit) => (
                StatusCode::BAD_REQUEST,
                "too_large",
                Some(format!("image exceeds {} bytes", limit)),
            ),
            AppError::UnsupportedType => (
                StatusCode::BAD_REQUEST,
                "unsupported_type",
                Some("image must be JPEG, PNG or WebP".to_string()),
            ),
            AppError::InvalidWeight(msg) => {
                (StatusCode::BAD_REQUEST, "invalid_weight", Some(msg.clone()))
            }
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", Some(msg.clone())),
            AppError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, "bad_request", Some(msg.clone()))
            }
            AppError::Database(msg) => {
                tracing::error!(error = %msg, "Database error");
                (StatusCode::INTERNAL_SERVER_ERROR, "database_error", None)
            }
            AppError::Internal(err) => {
                tracing::error!(error = %err, "Internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", None)
            }
        };

        let body = ErrorResponse {
            error: error.to_string(),
            details,
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for handlers
pub type Result<T> = std::result::Result<T, AppError>;
