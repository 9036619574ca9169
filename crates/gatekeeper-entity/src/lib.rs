//! # gatekeeper-entity
//!
//! Domain models for Gatekeeper. Database rows derive `sqlx::FromRow`;
//! derived values (permission sets, resolved sessions) are plain
//! serializable value objects.

pub mod permission;
pub mod session;
pub mod user;
