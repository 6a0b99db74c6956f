//! Application configuration loaded from environment variables.
//!
//! Secrets (SSO client secret, JWT signing key) are read once at startup
//! and cached in memory.

use std::env;

/// Default upload size cap: 16 MiB.
const DEFAULT_UPLOAD_MAX_BYTES: usize = 16 * 1024 * 1024;

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    // --- Environment Variables (non-sensitive) ---
    /// Animalia SSO OAuth client ID (public)
    pub animalia_client_id: String,
    /// Animalia SSO base URL (staging or production)
    pub sso_base_url: String,
    /// Callback URL registered with Animalia
    pub redirect_uri: String,
    /// Frontend URL for post-login redirects
    pub frontend_url: String,
    /// GCP project ID
    pub gcp_project_id: String,
    /// Directory where uploaded images are stored
    pub upload_dir: String,
    /// Maximum accepted image size in bytes
    pub upload_max_bytes: usize,
    /// Server port
    pub port: u16,

    // --- Secrets ---
    /// Animalia SSO OAuth client secret
    pub animalia_client_secret: String,
    /// JWT signing key for session tokens (raw bytes)
    pub jwt_signing_key: Vec<u8>,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        Ok(Self {
            animalia_client_id: env::var("ANIMALIA_CLIENT_ID")
                .map_err(|_| ConfigError::Missing("ANIMALIA_CLIENT_ID"))?,
            sso_base_url: env::var("ANIMALIA_SSO_BASE_URL")
                .unwrap_or_else(|_| "https://staging-sso.animalia.no".to_string()),
            redirect_uri: env::var("ANIMALIA_REDIRECT_URI").unwrap_or_else(|_| {
                "http://localhost:8000/api/auth/oauth/callback".to_string()
            }),
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:4200".to_string()),
            gcp_project_id: env::var("GCP_PROJECT_ID").unwrap_or_else(|_| "local-dev".to_string()),
            upload_dir: env::var("UPLOAD_DIR").unwrap_or_else(|_| "data/uploads".to_string()),
            upload_max_bytes: env::var("UPLOAD_MAX_BYTES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_UPLOAD_MAX_BYTES),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8000".to_string())
                .parse()
                .unwrap_or(8000),

            animalia_client_secret: env::var("ANIMALIA_CLIENT_SECRET")
                .map(|v| v.trim().to_string())
                .map_err(|_| ConfigError::Missing("ANIMALIA_CLIENT_SECRET"))?,
            jwt_signing_key: env::var("JWT_SIGNING_KEY")
                .map_err(|_| ConfigError::Missing("JWT_SIGNING_KEY"))?
                .into_bytes(),
        })
    }

    /// Default config for testing only.
    pub fn test_default() -> Self {
        Self {
            animalia_client_id: "test_client_id".to_string(),
            sso_base_url: "https://staging-sso.animalia.no".to_string(),
            redirect_uri: "http://localhost:8000/api/auth/oauth/callback".to_string(),
            frontend_url: "http://localhost:4200".to_string(),
            gcp_project_id: "test-project".to_string(),
            upload_dir: std::env::temp_dir()
                .join("kameraveiing-test-uploads")
                .to_string_lossy()
                .into_owned(),
            upload_max_bytes: DEFAULT_UPLOAD_MAX_BYTES,
            port: 8000,
            animalia_client_secret: "test_secret".to_string(),
            jwt_signing_key: b"test_jwt_key_32_bytes_minimum!!".to_vec(),
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_from_env() {
        // Set required env vars for test
        env::set_var("ANIMALIA_CLIENT_ID", "test_id");
        env::set_var("ANIMALIA_CLIENT_SECRET", "test_secret");
        env::set_var("JWT_SIGNING_KEY", "test_jwt_key_32_bytes_minimum!!");

        let config = Config::from_env().expect("Config should load");

        assert_eq!(config.animalia_client_id, "test_id");
        assert_eq!(config.animalia_client_secret, "test_secret");
        assert_eq!(config.upload_max_bytes, 16 * 1024 * 1024);
        assert_eq!(config.port, 8000);
    }
}
