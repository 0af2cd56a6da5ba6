//! # API Endpoint Handlers
//!
//! One submodule per resource. Handlers take the lock, call exactly one
//! `Tracker` operation and project the result into a response type; every
//! decision lives in the core.

pub mod auth;
pub mod badges;
pub mod categories;
pub mod submissions;
pub mod users;

use super::types::HealthResponse;
use axum::{Json, response::IntoResponse};

/// Health check endpoint.
pub async fn health_handler() -> impl IntoResponse {
    Json(HealthResponse::default())
}
