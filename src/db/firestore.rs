// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore client wrapper with typed operations.
//!
//! Provides high-level operations for:
//! - Users (farmer accounts, keyed by farmer ID)
//! - Uploads (weigh-in photo records, keyed by upload UUID)

use crate::db::collections;
use crate::error::AppError;
use crate::models::{Upload, User};

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreDb {
    client: Option<firestore::FirestoreDb>,
}

impl FirestoreDb {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self, AppError> {
        // If the emulator environment variable is set, use unauthenticated connection
        // to avoid local credential warnings and leakage.
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self, AppError> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        // Use ExternalJwtFunctionSource to provide a dummy token without needing
        // a custom TokenSource implementation struct.
        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            AppError::Database(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a mock Firestore client for testing (offline mode).
    ///
    /// All database operations will return an error if called.
    pub fn new_mock() -> Self {
        Self { client: None }
    }

    /// Helper to get the client or return an error if offline.
    fn get_client(&self) -> Result<&firestore::FirestoreDb, AppError> {
        self.client
            .as_ref()
            .ok_or_else(|| AppError::Database("Database not connected (offline mode)".to_string()))
    }

    // ─── User Operations ─────────────────────────────────────────

    /// Get a user by their farmer ID.
    pub async fn get_user_by_farmer_id(&self, farmer_id: &str) -> Result<Option<User>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::USERS)
            .obj()
            .one(farmer_id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get a user by their internal UUID.
    pub async fn get_user_by_id(&self, user_id: &str) -> Result<Option<User>, AppError> {
        let id = user_id.to_string();
        let matches: Vec<User> = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::USERS)
            .filter(move |q| q.field("id").eq(id.clone()))
            .limit(1)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(matches.into_iter().next())
    }

    /// Create a user. Fails if a document with the same farmer ID exists,
    /// which is what gives farmer IDs their uniqueness guarantee.
    pub async fn insert_user(&self, user: &User) -> Result<(), AppError> {
        let _: User = self
            .get_client()?
            .fluent()
            .insert()
            .into(collections::USERS)
            .document_id(&user.farmer_id)
            .object(user)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Update an existing user (e.g. last_login).
    pub async fn upsert_user(&self, user: &User) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::USERS)
            .document_id(&user.farmer_id)
            .object(user)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    // ─── Upload Operations ───────────────────────────────────────

    /// Create an upload record. Uses insert (not upsert) so an ID collision
    /// can never silently overwrite an existing record.
    pub async fn insert_upload(&self, upload: &Upload) -> Result<(), AppError> {
        let _: Upload = self
            .get_client()?
            .fluent()
            .insert()
            .into(collections::UPLOADS)
            .document_id(&upload.id)
            .object(upload)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Get the highest picture number recorded for a (pig_uid, user_id) pair,
    /// or 0 if the pair has no uploads yet.
    ///
    /// Callers assigning the next number must hold the per-pair upload lock;
    /// this query alone does not serialize concurrent writers.
    pub async fn last_picture_number(
        &self,
        pig_uid: &str,
        user_id: &str,
    ) -> Result<u32, AppError> {
        let pig_uid = pig_uid.to_string();
        let user_id = user_id.to_string();
        let latest: Vec<Upload> = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::UPLOADS)
            .filter(move |q| {
                q.for_all([
                    q.field("pig_uid").eq(pig_uid.clone()),
                    q.field("user_id").eq(user_id.clone()),
                ])
            })
            .order_by([(
                "picture_number",
                firestore::FirestoreQueryDirection::Descending,
            )])
            .limit(1)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(latest.first().map(|u| u.picture_number).unwrap_or(0))
    }

    /// Get a user's uploads, newest first.
    pub async fn get_uploads_for_user(
        &self,
        user_id: &str,
        limit: u32,
    ) -> Result<Vec<Upload>, AppError> {
        let user_id = user_id.to_string();
        self.get_client()?
            .fluent()
            .select()
            .from(collections::UPLOADS)
            .filter(move |q| q.field("user_id").eq(user_id.clone()))
            .order_by([("created_at", firestore::FirestoreQueryDirection::Descending)])
            .limit(limit)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get all of a user's uploads (for per-animal aggregation).
    pub async fn get_all_uploads_for_user(&self, user_id: &str) -> Result<Vec<Upload>, AppError> {
        let user_id = user_id.to_string();
        self.get_client()?
            .fluent()
            .select()
            .from(collections::UPLOADS)
            .filter(move |q| q.field("user_id").eq(user_id.clone()))
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}
