//! Role- and plan-based permission derivation.

pub mod policies;

pub use policies::RbacPolicies;
