//! # gatekeeper-database
//!
//! PostgreSQL connection management, migrations, and the session
//! repository read by the session resolver.

pub mod connection;
pub mod migration;
pub mod repositories;

pub use connection::DatabasePool;
