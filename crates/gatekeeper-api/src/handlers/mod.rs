//! HTTP handlers.

pub mod health;
pub mod session;

use gatekeeper_core::error::AppError;

use crate::error::ApiError;

/// Fallback for paths no handler serves.
pub async fn not_found() -> ApiError {
    AppError::not_found("No handler for this path").into()
}
