//! The validated session view handed to downstream handlers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::permission::{Permission, PermissionSet};
use crate::user::{Plan, UserRole};

/// A session that passed expiry and account checks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedSession {
    pub session_id: Uuid,
    pub user_id: Uuid,
    pub role: UserRole,
    pub plan: Plan,
    pub active: bool,
    pub permissions: PermissionSet,
    pub expires_at: DateTime<Utc>,
}

impl ResolvedSession {
    /// Check whether the session carries a permission.
    pub fn has_permission(&self, permission: Permission) -> bool {
        self.permissions.contains(permission)
    }

    /// A resolved session must name an active user. An empty permission set
    /// is still a valid session.
    pub fn is_valid(&self) -> bool {
        !self.user_id.is_nil() && self.active
    }
}
