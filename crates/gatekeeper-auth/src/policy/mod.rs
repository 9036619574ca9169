//! Protected-route table and the per-request decision chain.

pub mod engine;
pub mod rules;

pub use engine::{PolicyDecision, PolicyEngine, PolicyRequest};
pub use rules::{RouteRule, RouteTable, is_authorized};
