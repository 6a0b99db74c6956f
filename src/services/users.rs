// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! User directory: maps SSO identity claims to farmer accounts.

use crate::db::FirestoreDb;
use crate::error::AppError;
use crate::models::User;
use crate::services::animalia::IdentityClaim;
use ring::rand::{SecureRandom, SystemRandom};

/// Directory of farmer accounts, backed by the users collection.
#[derive(Clone)]
pub struct UserDirectory {
    db: FirestoreDb,
}

impl UserDirectory {
    pub fn new(db: FirestoreDb) -> Self {
        Self { db }
    }

    /// Look up the account for an identity claim, creating it on first sight.
    ///
    /// The farmer ID doubles as the document ID, so two concurrent first
    /// logins for the same identity cannot produce duplicate accounts: the
    /// losing insert fails and we return the winner's row.
    pub async fn resolve_or_create(&self, claim: &IdentityClaim) -> Result<User, AppError> {
        let farmer_id = match usable_farmer_id(&claim.farmer_id) {
            Some(id) => id,
            None => self.generate_farmer_id().await?,
        };

        let now = chrono::Utc::now().to_rfc3339();

        if let Some(mut user) = self.db.get_user_by_farmer_id(&farmer_id).await? {
            user.last_login = Some(now);
            self.db.upsert_user(&user).await?;
            return Ok(user);
        }

        let user = User {
            id: uuid::Uuid::new_v4().to_string(),
            farmer_id: farmer_id.clone(),
            email: claim.email.clone(),
            full_name: if claim.full_name.is_empty() {
                claim.email.clone()
            } else {
                claim.full_name.clone()
            },
            is_active: true,
            is_admin: false,
            created_at: now.clone(),
            last_login: Some(now),
        };

        match self.db.insert_user(&user).await {
            Ok(()) => {
                tracing::info!(farmer_id = %user.farmer_id, "Created new farmer account");
                Ok(user)
            }
            Err(insert_err) => {
                // Lost a concurrent-creation race; the existing row wins.
                self.db
                    .get_user_by_farmer_id(&farmer_id)
                    .await?
                    .ok_or(insert_err)
            }
        }
    }

    /// Point lookup by internal UUID. Absence is NotFound, not a failure.
    pub async fn by_internal_id(&self, user_id: &str) -> Result<Option<User>, AppError> {
        self.db.get_user_by_id(user_id).await
    }

    /// Point lookup by farmer ID.
    pub async fn by_farmer_id(&self, farmer_id: &str) -> Result<Option<User>, AppError> {
        self.db.get_user_by_farmer_id(farmer_id).await
    }

    /// Generate a fresh farmer ID (`F` + 8 uppercase hex chars), retrying
    /// on the unlikely collision with an existing account.
    async fn generate_farmer_id(&self) -> Result<String, AppError> {
        let rng = SystemRandom::new();
        loop {
            let mut bytes = [0u8; 4];
            rng.fill(&mut bytes)
                .map_err(|_| AppError::Internal(anyhow::anyhow!("System RNG failure")))?;
            let candidate = format!("F{}", hex::encode_upper(bytes));

            if self.db.get_user_by_farmer_id(&candidate).await?.is_none() {
                return Ok(candidate);
            }
        }
    }
}

/// A provider-supplied farmer ID is usable if it is non-empty after trimming.
fn usable_farmer_id(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_usable_farmer_id() {
        assert_eq!(usable_farmer_id("F1A2B3C4"), Some("F1A2B3C4".to_string()));
        assert_eq!(usable_farmer_id("  991234 "), Some("991234".to_string()));
        assert_eq!(usable_farmer_id(""), None);
        assert_eq!(usable_farmer_id("   "), None);
    }
}
