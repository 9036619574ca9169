//! # gatekeeper-api
//!
//! HTTP layer for Gatekeeper built on Axum.
//!
//! Every request passes through the gate middleware, which runs the policy
//! engine and turns its decision into a redirect, a 403, a 429, or a
//! pass-through with request tracking headers. Also provides the health
//! and current-session endpoints and the server runner.

pub mod app;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod state;

pub use app::{build_app, run_server};
pub use state::AppState;
