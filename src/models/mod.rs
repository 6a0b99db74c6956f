// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod upload;
pub mod user;

pub use upload::{AnimalSummary, Upload};
pub use user::User;
