// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Kameraveiing Collector API Server
//!
//! Collects livestock weigh-in photos from farmers authenticated through
//! Animalia SSO, recording weight and animal identity for each upload.

use kameraveiing_collector::{
    config::Config,
    db::FirestoreDb,
    services::{AnimaliaService, ImageStore, LoginStateStore, UploadService, UserDirectory},
    AppState,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging
    init_logging();

    // Load configuration from environment
    let config = Config::from_env().expect("Failed to load configuration");
    tracing::info!(port = config.port, "Starting Kameraveiing Collector API");

    // Initialize Firestore database
    let db = FirestoreDb::new(&config.gcp_project_id)
        .await
        .expect("Failed to connect to Firestore");

    // Initialize SSO client and login state store
    let animalia = AnimaliaService::new(&config);
    let login_states = LoginStateStore::new();
    tracing::info!(sso = %config.sso_base_url, "Animalia SSO client initialized");

    // Initialize image store and upload service
    let store = ImageStore::new(&config.upload_dir);
    tracing::info!(dir = %config.upload_dir, "Image store initialized");

    let uploads = UploadService::new(db.clone(), store, config.upload_max_bytes);
    let users = UserDirectory::new(db.clone());

    // Build shared state
    let state = Arc::new(AppState {
        config: config.clone(),
        db,
        animalia,
        login_states,
        users,
        uploads,
    });

    // Build router
    let app = kameraveiing_collector::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging.
fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("kameraveiing_collector=debug".parse().unwrap())
                .add_directive("info".parse().unwrap()),
        )
        .with(format)
        .init();
}
