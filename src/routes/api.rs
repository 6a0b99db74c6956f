// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! API routes for authenticated farmers.

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::Upload;
use crate::AppState;
use axum::{
    extract::{Multipart, Query, State},
    http::StatusCode,
    routing::{get, post},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// API routes (require authentication via JWT).
/// The auth middleware is applied in routes/mod.rs for these routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/user", get(get_me))
        .route("/api/upload", post(create_upload))
        .route("/api/uploads", get(list_uploads))
        .route("/api/animals", get(list_animals))
}

// ─── User Profile ────────────────────────────────────────────

/// Current user response.
#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct UserResponse {
    pub user_id: String,
    pub authenticated: bool,
    pub full_name: String,
}

/// Get current user profile.
///
/// The session token only proves identity; active/admin flags come from the
/// directory, so this is a live lookup.
async fn get_me(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<UserResponse>> {
    let profile = state
        .users
        .by_internal_id(&user.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {} not found", user.user_id)))?;

    Ok(Json(UserResponse {
        user_id: profile.farmer_id,
        authenticated: true,
        full_name: profile.full_name,
    }))
}

// ─── Upload ──────────────────────────────────────────────────

/// Created upload response.
#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct UploadResponse {
    pub id: String,
    pub pig_uid: String,
    pub user_id: String,
    pub picture_number: u32,
    pub image_url: String,
    pub weight: f64,
}

impl From<Upload> for UploadResponse {
    fn from(upload: Upload) -> Self {
        Self {
            id: upload.id,
            pig_uid: upload.pig_uid,
            user_id: upload.user_id,
            picture_number: upload.picture_number,
            image_url: format!("/files/{}", upload.filename),
            weight: upload.weight_kg,
        }
    }
}

/// Upload a weigh-in photo (multipart: image file, weight field, optional
/// pig_uid field).
async fn create_upload(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<UploadResponse>)> {
    let mut image: Option<(Option<String>, Vec<u8>)> = None;
    let mut weight: Option<String> = None;
    let mut pig_uid: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Failed to parse multipart form: {}", e)))?
    {
        match field.name().unwrap_or("") {
            "image" => {
                let declared_filename = field.file_name().map(|s| s.to_string());
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::BadRequest(format!("Failed to read image: {}", e)))?
                    .to_vec();
                image = Some((declared_filename, bytes));
            }
            "weight" => {
                weight = Some(field.text().await.map_err(|e| {
                    AppError::BadRequest(format!("Failed to read weight field: {}", e))
                })?);
            }
            "pig_uid" => {
                pig_uid = Some(field.text().await.map_err(|e| {
                    AppError::BadRequest(format!("Failed to read pig_uid field: {}", e))
                })?);
            }
            _ => {}
        }
    }

    let (declared_filename, image_bytes) =
        image.ok_or_else(|| AppError::BadRequest("missing image".to_string()))?;
    let weight =
        weight.ok_or_else(|| AppError::InvalidWeight("missing weight field".to_string()))?;

    let upload = state
        .uploads
        .record(
            &user.farmer_id,
            pig_uid.as_deref(),
            &weight,
            &image_bytes,
            declared_filename.as_deref(),
        )
        .await?;

    Ok((StatusCode::CREATED, Json(upload.into())))
}

// ─── Upload Listing ──────────────────────────────────────────

#[derive(Deserialize)]
struct UploadsQuery {
    /// Pagination: max items to return
    #[serde(default = "default_limit")]
    limit: u32,
}

fn default_limit() -> u32 {
    100
}

/// One row in the uploads listing.
#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct UploadListItem {
    pub id: String,
    pub pig_uid: String,
    pub user_id: String,
    pub picture_number: u32,
    pub image_url: String,
    pub weight: f64,
    pub created_at: String,
}

/// Get the current farmer's uploads, newest first.
async fn list_uploads(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Query(params): Query<UploadsQuery>,
) -> Result<Json<Vec<UploadListItem>>> {
    let uploads = state
        .uploads
        .list_for_user(&user.farmer_id, params.limit)
        .await?;

    Ok(Json(
        uploads
            .into_iter()
            .map(|u| UploadListItem {
                id: u.id,
                pig_uid: u.pig_uid,
                user_id: u.user_id,
                picture_number: u.picture_number,
                image_url: format!("/files/{}", u.filename),
                weight: u.weight_kg,
                created_at: u.created_at,
            })
            .collect(),
    ))
}

// ─── Animals ─────────────────────────────────────────────────

/// Per-animal summary row.
#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct AnimalResponse {
    pub pig_uid: String,
    pub user_id: String,
    pub weight: f64,
    pub picture_count: u32,
    pub latest_upload: String,
}

/// Get the current farmer's animals with picture counts.
async fn list_animals(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<AnimalResponse>>> {
    let animals = state.uploads.list_animals_for_user(&user.farmer_id).await?;

    Ok(Json(
        animals
            .into_iter()
            .map(|a| AnimalResponse {
                pig_uid: a.pig_uid,
                user_id: a.user_id,
                weight: a.weight,
                picture_count: a.picture_count,
                latest_upload: a.latest_upload,
            })
            .collect(),
    ))
}
