//! Route definitions.

use std::time::Duration;

use axum::Router;
use axum::middleware::{from_fn, from_fn_with_state};
use axum::routing::get;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::middleware::{cors, gate, logging};
use crate::state::AppState;

/// Build the router, mounting `app_routes` behind the gate alongside the
/// built-in endpoints.
///
/// Layer order, outermost first: logging, CORS, trace, timeout, gate.
pub fn build_router(state: AppState, app_routes: Router<AppState>) -> Router {
    let timeout = Duration::from_secs(state.config.server.request_timeout_seconds);
    let cors = cors::build_cors_layer(&state.config.server.cors);

    Router::new()
        .route("/health", get(handlers::health::health))
        .route("/api/session", get(handlers::session::current_session))
        .merge(app_routes)
        .fallback(handlers::not_found)
        .layer(from_fn_with_state(state.clone(), gate::gate))
        .layer(TimeoutLayer::new(timeout))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(from_fn(logging::request_logging))
        .with_state(state)
}
