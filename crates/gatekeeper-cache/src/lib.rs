//! # gatekeeper-cache
//!
//! Shared counter store for Gatekeeper. Two backends:
//!
//! - **memory**: in-process store keeping expiring counters in a
//!   [dashmap](https://crates.io/crates/dashmap)
//! - **redis**: Redis-backed store using the [redis](https://crates.io/crates/redis)
//!   crate, with counter increments done in a Lua script
//!
//! The provider is selected at runtime based on configuration.

pub mod keys;
#[cfg(feature = "memory")]
pub mod memory;
pub mod provider;
#[cfg(feature = "redis-backend")]
pub mod redis;

pub use provider::CacheManager;
