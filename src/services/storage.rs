// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Image store: format sniffing, deterministic naming, and artifact writes.

use crate::error::AppError;
use image::ImageFormat;
use std::path::PathBuf;

/// Filesystem-backed store for uploaded images, keyed by filename.
#[derive(Clone)]
pub struct ImageStore {
    root: PathBuf,
}

impl ImageStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Write artifact bytes under the given filename.
    pub async fn save(&self, filename: &str, bytes: &[u8]) -> Result<(), AppError> {
        tokio::fs::create_dir_all(&self.root)
            .await
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to create upload dir: {}", e)))?;

        let path = self.root.join(filename);
        tokio::fs::write(&path, bytes)
            .await
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to write image: {}", e)))?;

        Ok(())
    }

    pub fn root(&self) -> &std::path::Path {
        &self.root
    }
}

/// Sniff the image format from the artifact bytes. The declared content type
/// and filename extension are never consulted.
pub fn sniff_image_format(bytes: &[u8]) -> Result<ImageFormat, AppError> {
    let format = image::guess_format(bytes).map_err(|_| AppError::UnsupportedType)?;
    match format {
        ImageFormat::Jpeg | ImageFormat::Png | ImageFormat::WebP => Ok(format),
        _ => Err(AppError::UnsupportedType),
    }
}

/// Filename extension for a sniffed format.
pub fn format_extension(format: ImageFormat) -> &'static str {
    match format {
        ImageFormat::Jpeg => "jpg",
        ImageFormat::WebP => "webp",
        _ => "png",
    }
}

/// Reduce an identifier to filesystem-safe characters. Empty results fall
/// back to "unknown" rather than producing ambiguous names.
pub fn sanitize_component(raw: &str) -> String {
    let safe: String = raw
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
        .collect();

    if safe.is_empty() {
        "unknown".to_string()
    } else {
        safe
    }
}

/// Build the stored filename. The format is load-bearing: archived images
/// are keyed by it, and the name alone reconstructs the logical key.
///
/// `{weight:.2}kg_uid{pig_uid}_{picture_number}_userID{user_id}.{ext}`
pub fn stored_filename(
    weight_kg: f64,
    pig_uid: &str,
    picture_number: u32,
    user_id: &str,
    ext: &str,
) -> String {
    format!(
        "{:.2}kg_uid{}_{}_userID{}.{}",
        weight_kg,
        sanitize_component(pig_uid),
        picture_number,
        sanitize_component(user_id),
        ext
    )
}
