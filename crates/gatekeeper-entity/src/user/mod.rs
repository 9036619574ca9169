//! User role and plan enumerations.

pub mod plan;
pub mod role;

pub use plan::Plan;
pub use role::UserRole;
