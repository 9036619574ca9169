//! Permission values derived from a user's role and plan.

pub mod model;

pub use model::{Permission, PermissionSet};
