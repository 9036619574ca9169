//! # gatekeeper-auth
//!
//! Server-side request gating for Gatekeeper.
//!
//! ## Modules
//!
//! - `session` - session cookie resolution against the session store
//! - `rbac` - permission derivation from role and plan
//! - `ratelimit` - fixed-window rate limiting over the shared counter store
//! - `policy` - protected-route table and the per-request decision chain

pub mod policy;
pub mod ratelimit;
pub mod rbac;
pub mod session;

pub use policy::{PolicyDecision, PolicyEngine, PolicyRequest, RouteRule, RouteTable};
pub use ratelimit::{Clock, RateLimitOptions, RateLimitResult, RateLimiter, SystemClock, WindowSize};
pub use rbac::RbacPolicies;
pub use session::{MemorySessionStore, PgSessionStore, SessionResolver, SessionStore};
