//! Application builder and server runner.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use tokio::net::TcpListener;
use tracing::{error, info, warn};

use gatekeeper_auth::{
    MemorySessionStore, PgSessionStore, PolicyEngine, RateLimiter, RouteTable, SessionResolver,
    SessionStore,
};
use gatekeeper_cache::CacheManager;
use gatekeeper_core::config::AppConfig;
use gatekeeper_core::error::{AppError, ErrorKind};
use gatekeeper_core::result::AppResult;
use gatekeeper_database::DatabasePool;
use gatekeeper_database::migration::run_migrations;
use gatekeeper_database::repositories::session::SessionRepository;

use crate::router::build_router;
use crate::state::AppState;

/// Builds the full Axum application with the given state.
pub fn build_app(state: AppState) -> Router {
    build_router(state, Router::new())
}

/// Wire up every service from configuration.
///
/// Connects the counter store, and the database when sessions are kept in
/// Postgres. Returns an error if any backend is unreachable or the route
/// table is invalid.
pub async fn build_state(config: AppConfig) -> AppResult<AppState> {
    config.validate()?;

    let routes = RouteTable::from_config(&config.routes)?;

    let cache = Arc::new(CacheManager::new(&config.cache).await?);
    info!(provider = cache.provider_name(), "Counter store ready");

    let (sessions, database): (Arc<dyn SessionStore>, Option<DatabasePool>) =
        match config.session.store.as_str() {
            "postgres" => {
                let db = DatabasePool::connect(&config.database).await?;
                if config.database.run_migrations {
                    run_migrations(db.pool()).await?;
                }
                let store: Arc<dyn SessionStore> =
                    Arc::new(PgSessionStore::new(SessionRepository::new(db.pool().clone())));
                (store, Some(db))
            }
            "memory" => {
                warn!("Using in-memory session store; sessions are not shared between instances");
                let store: Arc<dyn SessionStore> = Arc::new(MemorySessionStore::new());
                (store, None)
            }
            other => {
                return Err(AppError::configuration(format!(
                    "Unknown session store: {other}"
                )));
            }
        };

    let resolver = SessionResolver::new(sessions, config.session.clone());
    let limiter = RateLimiter::new(
        cache.clone(),
        Duration::from_millis(config.cache.command_timeout_ms),
    );
    let engine = PolicyEngine::new(routes, resolver, limiter);

    Ok(AppState::new(config, engine, cache, database))
}

/// Build services, serve until a shutdown signal arrives, then release the
/// database pool.
pub async fn run_server(config: AppConfig) -> AppResult<()> {
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let state = build_state(config).await?;
    let database = state.database.clone();
    let app = build_app(state);

    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Configuration, format!("Failed to bind {addr}"), e)
        })?;
    info!(address = %addr, "Gatekeeper listening");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    if let Some(db) = database {
        db.close().await;
    }
    info!("Server shut down gracefully");
    Ok(())
}

/// Resolves on Ctrl+C, or SIGTERM on Unix.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, shutting down"),
        _ = terminate => info!("Received SIGTERM, shutting down"),
    }
}
