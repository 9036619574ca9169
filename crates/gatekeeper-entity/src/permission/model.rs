//! Permission enumeration and ordered permission set.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

/// A single capability granted to a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    /// Read application content.
    ContentRead,
    /// Create and edit application content.
    ContentWrite,
    /// View the caller's own usage and billing.
    BillingView,
    /// Change the caller's own subscription.
    BillingManage,
    /// Export data in bulk.
    DataExport,
    /// Call the public API with personal tokens.
    ApiAccess,
    /// View organisation analytics.
    AnalyticsView,
    /// Manage other user accounts.
    UsersManage,
    /// Inspect and reset rate-limit counters.
    RateLimitsManage,
    /// Change system-wide settings.
    SystemManage,
}

impl Permission {
    /// Return the permission as its wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ContentRead => "content_read",
            Self::ContentWrite => "content_write",
            Self::BillingView => "billing_view",
            Self::BillingManage => "billing_manage",
            Self::DataExport => "data_export",
            Self::ApiAccess => "api_access",
            Self::AnalyticsView => "analytics_view",
            Self::UsersManage => "users_manage",
            Self::RateLimitsManage => "rate_limits_manage",
            Self::SystemManage => "system_manage",
        }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Ordered set of permissions. Equality ignores insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PermissionSet(BTreeSet<Permission>);

impl PermissionSet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self(BTreeSet::new())
    }

    /// Add a permission.
    pub fn insert(&mut self, permission: Permission) {
        self.0.insert(permission);
    }

    /// Add every permission from `other`.
    pub fn extend(&mut self, permissions: impl IntoIterator<Item = Permission>) {
        self.0.extend(permissions);
    }

    pub fn contains(&self, permission: Permission) -> bool {
        self.0.contains(&permission)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate in canonical order.
    pub fn iter(&self) -> impl Iterator<Item = Permission> + '_ {
        self.0.iter().copied()
    }
}

impl FromIterator<Permission> for PermissionSet {
    fn from_iter<I: IntoIterator<Item = Permission>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_equality_is_order_independent() {
        let a: PermissionSet = [Permission::ApiAccess, Permission::ContentRead]
            .into_iter()
            .collect();
        let b: PermissionSet = [Permission::ContentRead, Permission::ApiAccess]
            .into_iter()
            .collect();
        assert_eq!(a, b);
    }

    #[test]
    fn test_serializes_as_sorted_list() {
        let set: PermissionSet = [Permission::DataExport, Permission::ContentRead]
            .into_iter()
            .collect();
        let json = serde_json::to_string(&set).unwrap();
        assert_eq!(json, r#"["content_read","data_export"]"#);
    }
}
