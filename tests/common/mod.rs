// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use kameraveiing_collector::config::Config;
use kameraveiing_collector::db::FirestoreDb;
use kameraveiing_collector::middleware::auth::create_jwt;
use kameraveiing_collector::models::User;
use kameraveiing_collector::routes::create_router;
use kameraveiing_collector::services::{
    AnimaliaService, ImageStore, LoginStateStore, UploadService, UserDirectory,
};
use kameraveiing_collector::AppState;
use std::sync::Arc;

/// Check if emulator is available via environment variable.
#[allow(dead_code)]
pub fn emulator_available() -> bool {
    std::env::var("FIRESTORE_EMULATOR_HOST").is_ok()
}

/// Skip test with message if emulator not available.
#[macro_export]
macro_rules! require_emulator {
    () => {
        if !crate::common::emulator_available() {
            eprintln!("⚠️  Skipping: FIRESTORE_EMULATOR_HOST not set");
            return;
        }
    };
}

/// Create a test database connection.
#[allow(dead_code)]
pub async fn test_db() -> FirestoreDb {
    FirestoreDb::new("test-project")
        .await
        .expect("Failed to connect to Firestore emulator")
}

/// Create a mock database connection (offline).
#[allow(dead_code)]
pub fn test_db_offline() -> FirestoreDb {
    FirestoreDb::new_mock()
}

/// Build an app over the given database.
#[allow(dead_code)]
pub fn build_app(config: Config, db: FirestoreDb) -> (axum::Router, Arc<AppState>) {
    let animalia = AnimaliaService::new(&config);
    let store = ImageStore::new(&config.upload_dir);
    let uploads = UploadService::new(db.clone(), store, config.upload_max_bytes);
    let users = UserDirectory::new(db.clone());

    let state = Arc::new(AppState {
        config,
        db,
        animalia,
        login_states: LoginStateStore::new(),
        users,
        uploads,
    });

    (create_router(state.clone()), state)
}

/// Create a test app with offline mock dependencies.
/// Returns the router and the shared state.
#[allow(dead_code)]
pub fn create_test_app() -> (axum::Router, Arc<AppState>) {
    build_app(Config::test_default(), test_db_offline())
}

/// A user fixture matching the session tokens below.
#[allow(dead_code)]
pub fn test_user(farmer_id: &str) -> User {
    User {
        id: format!("internal-{}", farmer_id),
        farmer_id: farmer_id.to_string(),
        email: format!("{}@example.no", farmer_id.to_lowercase()),
        full_name: "Test Farmer".to_string(),
        is_active: true,
        is_admin: false,
        created_at: "2026-01-01T00:00:00+00:00".to_string(),
        last_login: None,
    }
}

/// Create a valid session token for a farmer.
#[allow(dead_code)]
pub fn create_test_jwt(farmer_id: &str, signing_key: &[u8]) -> String {
    create_jwt(&test_user(farmer_id), signing_key).expect("Failed to create JWT")
}
