//! Core types, configuration, errors, and traits for Gatekeeper.
//!
//! This crate is the foundation layer. Every other crate in the workspace
//! depends on it for the shared error type, configuration schemas, and the
//! counter-store abstraction.

pub mod config;
pub mod error;
pub mod redact;
pub mod result;
pub mod traits;

pub use error::AppError;
pub use result::AppResult;
