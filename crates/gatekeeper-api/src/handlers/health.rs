//! Health check handler.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use serde::Serialize;
use tracing::warn;

use gatekeeper_core::traits::cache::CacheProvider;

use crate::state::AppState;

/// Health report body.
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub uptime_seconds: u64,
    pub cache: ComponentStatus,
    pub database: ComponentStatus,
}

/// Reachability of one backing service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ComponentStatus {
    Up,
    Down,
    Disabled,
}

/// GET /health
///
/// 200 when every configured backend answers, 503 otherwise.
pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let cache = match state.cache.health_check().await {
        Ok(true) => ComponentStatus::Up,
        Ok(false) => ComponentStatus::Down,
        Err(e) => {
            warn!(provider = state.cache.provider_name(), error = %e, "Cache health check failed");
            ComponentStatus::Down
        }
    };

    let database = match &state.database {
        None => ComponentStatus::Disabled,
        Some(db) => match db.health_check().await {
            Ok(true) => ComponentStatus::Up,
            Ok(false) => ComponentStatus::Down,
            Err(e) => {
                warn!(error = %e, "Database health check failed");
                ComponentStatus::Down
            }
        },
    };

    let healthy = cache != ComponentStatus::Down && database != ComponentStatus::Down;
    let status = if healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status,
        Json(HealthResponse {
            status: if healthy { "ok" } else { "degraded" },
            version: env!("CARGO_PKG_VERSION"),
            uptime_seconds: state.started_at.elapsed().as_secs(),
            cache,
            database,
        }),
    )
}
