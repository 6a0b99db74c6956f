// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Upload record model for storage and API.

use serde::{Deserialize, Serialize};

/// One recorded weigh-in photo. Written once, never mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Upload {
    /// Upload ID (UUID, also used as document ID)
    pub id: String,
    /// Animal identifier the photo belongs to
    pub pig_uid: String,
    /// Owning farmer ID
    pub user_id: String,
    /// Per-(pig_uid, user_id) sequence number, starting at 1
    pub picture_number: u32,
    /// Stored filename in the image store
    pub filename: String,
    /// Weight recorded at the weigh-in, in kilograms
    pub weight_kg: f64,
    /// When the upload was recorded (RFC3339)
    pub created_at: String,
}

/// Per-animal aggregate over a farmer's uploads.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnimalSummary {
    /// Animal identifier
    pub pig_uid: String,
    /// Owning farmer ID
    pub user_id: String,
    /// Number of photos recorded for this animal
    pub picture_count: u32,
    /// Timestamp of the most recent upload (RFC3339)
    pub latest_upload: String,
    /// Weight from the most recent upload, in kilograms
    pub weight: f64,
}
