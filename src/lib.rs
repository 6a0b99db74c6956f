// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Kameraveiing collector: weigh-in photo collection for livestock farmers
//!
//! This crate provides the backend API that lets farmers authenticate via
//! Animalia SSO and upload weigh-in photos of their animals.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;

use config::Config;
use db::FirestoreDb;
use services::{AnimaliaService, LoginStateStore, UploadService, UserDirectory};

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub db: FirestoreDb,
    pub animalia: AnimaliaService,
    pub login_states: LoginStateStore,
    pub users: UserDirectory,
    pub uploads: UploadService,
}
