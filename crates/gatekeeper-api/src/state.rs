//! Application state shared across all handlers and middleware.

use std::sync::Arc;
use std::time::Instant;

use gatekeeper_auth::PolicyEngine;
use gatekeeper_cache::CacheManager;
use gatekeeper_core::config::AppConfig;
use gatekeeper_database::DatabasePool;

/// Application state containing all shared dependencies.
///
/// Passed to every Axum handler via `State<AppState>`.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Application configuration
    pub config: Arc<AppConfig>,
    /// Route table, session resolver, and rate limiter
    pub policy: Arc<PolicyEngine>,
    /// Shared counter store (Redis or in-memory)
    pub cache: Arc<CacheManager>,
    /// PostgreSQL pool, absent when sessions are kept in memory
    pub database: Option<DatabasePool>,
    /// Process start, for uptime reporting
    pub started_at: Instant,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        policy: PolicyEngine,
        cache: Arc<CacheManager>,
        database: Option<DatabasePool>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            policy: Arc::new(policy),
            cache,
            database,
            started_at: Instant::now(),
        }
    }
}
