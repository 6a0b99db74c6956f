// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Upload recording and per-user queries.
//!
//! Handles:
//! - Artifact validation (size cap, content sniffing, weight parsing)
//! - Race-free per-(pig_uid, user) picture numbering
//! - Deterministic artifact naming and storage
//! - Read-only views over a farmer's uploads

use crate::db::FirestoreDb;
use crate::error::AppError;
use crate::models::{AnimalSummary, Upload};
use crate::services::storage::{
    format_extension, sniff_image_format, stored_filename, ImageStore,
};
use dashmap::DashMap;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Hard cap on a single listing page.
pub const MAX_LIST_LIMIT: u32 = 100;

/// Per-(pig_uid, user_id) locks serializing picture-number assignment.
/// Keyed per pair so uploads for different animals never contend.
pub type PairLocks = Arc<DashMap<(String, String), Arc<Mutex<()>>>>;

/// Upload recording and query service.
#[derive(Clone)]
pub struct UploadService {
    db: FirestoreDb,
    store: ImageStore,
    max_upload_bytes: usize,
    pair_locks: PairLocks,
}

impl UploadService {
    pub fn new(db: FirestoreDb, store: ImageStore, max_upload_bytes: usize) -> Self {
        Self {
            db,
            store,
            max_upload_bytes,
            pair_locks: Arc::new(DashMap::new()),
        }
    }

    /// Validate, name, store, and record one uploaded image.
    ///
    /// Validation order is fixed: size cap, then sniffed format, then
    /// weight. Nothing is written until all three pass.
    pub async fn record(
        &self,
        farmer_id: &str,
        pig_uid: Option<&str>,
        weight_raw: &str,
        image_bytes: &[u8],
        declared_filename: Option<&str>,
    ) -> Result<Upload, AppError> {
        if image_bytes.len() > self.max_upload_bytes {
            return Err(AppError::TooLarge(self.max_upload_bytes));
        }

        // The declared filename/content type is never trusted for format
        // decisions; the bytes are the only authority.
        let format = sniff_image_format(image_bytes)?;

        let weight_kg = parse_weight(weight_raw)?;

        // A missing animal ID gets a generated one namespaced by farmer, so
        // two farmers can never collide on a default ID.
        let pig_uid = match pig_uid {
            Some(uid) if !uid.trim().is_empty() => uid.trim().to_string(),
            _ => format!("{}_{}", farmer_id, chrono::Utc::now().timestamp()),
        };

        // Serialize number assignment per (pig_uid, farmer) pair. Uploads
        // for other pairs proceed in parallel.
        let lock = self
            .pair_locks
            .entry((pig_uid.clone(), farmer_id.to_string()))
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        let _guard = lock.lock().await;

        let picture_number = self.db.last_picture_number(&pig_uid, farmer_id).await? + 1;

        let filename = stored_filename(
            weight_kg,
            &pig_uid,
            picture_number,
            farmer_id,
            format_extension(format),
        );

        self.store.save(&filename, image_bytes).await?;

        let upload = Upload {
            id: uuid::Uuid::new_v4().to_string(),
            pig_uid: pig_uid.clone(),
            user_id: farmer_id.to_string(),
            picture_number,
            filename: filename.clone(),
            weight_kg,
            created_at: chrono::Utc::now().to_rfc3339(),
        };

        // The caller must never see success unless the metadata record is
        // durable. A failure here leaves an orphaned artifact behind, which
        // is logged and tolerated.
        if let Err(e) = self.db.insert_upload(&upload).await {
            tracing::warn!(
                filename = %filename,
                farmer_id,
                "Metadata write failed, artifact left orphaned in store"
            );
            return Err(e);
        }

        tracing::info!(
            farmer_id,
            pig_uid = %upload.pig_uid,
            picture_number,
            declared_filename = ?declared_filename,
            "Upload recorded"
        );

        Ok(upload)
    }

    /// A farmer's uploads, newest first, capped at MAX_LIST_LIMIT.
    pub async fn list_for_user(&self, farmer_id: &str, limit: u32) -> Result<Vec<Upload>, AppError> {
        self.db
            .get_uploads_for_user(farmer_id, limit.min(MAX_LIST_LIMIT))
            .await
    }

    /// Per-animal aggregates across one farmer's uploads.
    pub async fn list_animals_for_user(
        &self,
        farmer_id: &str,
    ) -> Result<Vec<AnimalSummary>, AppError> {
        let uploads = self.db.get_all_uploads_for_user(farmer_id).await?;

        let mut latest: HashMap<String, (u32, &Upload)> = HashMap::new();
        for upload in &uploads {
            let entry = latest
                .entry(upload.pig_uid.clone())
                .or_insert((0, upload));
            entry.0 += 1;
            // Picture numbers break ties for uploads in the same instant.
            if (upload.created_at.as_str(), upload.picture_number)
                > (entry.1.created_at.as_str(), entry.1.picture_number)
            {
                entry.1 = upload;
            }
        }

        let mut animals: Vec<AnimalSummary> = latest
            .into_iter()
            .map(|(pig_uid, (count, newest))| AnimalSummary {
                pig_uid,
                user_id: farmer_id.to_string(),
                picture_count: count,
                latest_upload: newest.created_at.clone(),
                weight: newest.weight_kg,
            })
            .collect();

        // Most recently photographed animals first.
        animals.sort_by(|a, b| b.latest_upload.cmp(&a.latest_upload));

        Ok(animals)
    }
}

/// Parse a submitted weight. Must be a finite number strictly above zero.
fn parse_weight(raw: &str) -> Result<f64, AppError> {
    let weight: f64 = raw
        .trim()
        .parse()
        .map_err(|_| AppError::InvalidWeight(format!("not a number: {:?}", raw)))?;

    if !weight.is_finite() || weight <= 0.0 {
        return Err(AppError::InvalidWeight(format!(
            "must be a positive number, got {}",
            weight
        )));
    }

    Ok(weight)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_weight_valid() {
        assert_eq!(parse_weight("61.00").unwrap(), 61.0);
        assert_eq!(parse_weight(" 63.5 ").unwrap(), 63.5);
        assert_eq!(parse_weight("1").unwrap(), 1.0);
    }

    #[test]
    fn test_parse_weight_rejects_non_positive() {
        assert!(matches!(parse_weight("0"), Err(AppError::InvalidWeight(_))));
        assert!(matches!(
            parse_weight("-12.5"),
            Err(AppError::InvalidWeight(_))
        ));
    }

    #[test]
    fn test_parse_weight_rejects_garbage() {
        assert!(matches!(
            parse_weight("heavy"),
            Err(AppError::InvalidWeight(_))
        ));
        assert!(matches!(parse_weight(""), Err(AppError::InvalidWeight(_))));
        assert!(matches!(
            parse_weight("NaN"),
            Err(AppError::InvalidWeight(_))
        ));
        assert!(matches!(
            parse_weight("inf"),
            Err(AppError::InvalidWeight(_))
        ));
    }
}
