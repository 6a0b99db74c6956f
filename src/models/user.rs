//! User model for storage and API.

use serde::{Deserialize, Serialize};

/// Farmer account stored in Firestore, keyed by farmer ID.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Internal ID (UUID)
    pub id: String,
    /// Human-presentable farmer ID (also used as document ID).
    /// Unique and immutable once assigned.
    pub farmer_id: String,
    /// Email address from the SSO claim
    pub email: String,
    /// Display name
    pub full_name: String,
    /// Whether the account is active
    pub is_active: bool,
    /// Whether the account has admin rights
    pub is_admin: bool,
    /// When the user first logged in (RFC3339)
    pub created_at: String,
    /// Most recent login (RFC3339)
    pub last_login: Option<String>,
}
