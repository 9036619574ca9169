//! Stored session row joined with its owning user.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::user::{Plan, UserRole};

/// A session as read from the session store.
///
/// Sessions are created at login by the identity provider. This service
/// only reads them, refreshes the last-seen fields, and deletes expired
/// rows.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct SessionRecord {
    /// Session row identifier.
    pub id: Uuid,
    /// Opaque token carried in the session cookie.
    pub session_token: String,
    /// Owning user.
    pub user_id: Uuid,
    /// Owning user's role.
    pub role: UserRole,
    /// Owning user's plan.
    pub plan: Plan,
    /// Whether the owning user account is enabled.
    pub active: bool,
    /// Absolute expiry.
    pub expires: DateTime<Utc>,
    /// IP address seen on the most recent authenticated request.
    pub ip_address: Option<String>,
    /// User-Agent seen on the most recent authenticated request.
    pub user_agent: Option<String>,
}

impl SessionRecord {
    /// Whether the session expired strictly before `now`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires < now
    }
}
