// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod animalia;
pub mod storage;
pub mod uploads;
pub mod users;

pub use animalia::{AnimaliaService, IdentityClaim, LoginStateStore};
pub use storage::ImageStore;
pub use uploads::UploadService;
pub use users::UserDirectory;
