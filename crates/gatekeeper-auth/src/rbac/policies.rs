//! Role and plan to permission mapping definitions.

use std::collections::{HashMap, HashSet};

use gatekeeper_entity::permission::{Permission, PermissionSet};
use gatekeeper_entity::user::{Plan, UserRole};

/// Maps each role and each plan to the permissions it grants.
///
/// A session's permissions are the union of its role grants and its plan
/// grants.
#[derive(Debug, Clone)]
pub struct RbacPolicies {
    roles: HashMap<UserRole, HashSet<Permission>>,
    plans: HashMap<Plan, HashSet<Permission>>,
}

impl RbacPolicies {
    /// Creates the default policy set.
    pub fn new() -> Self {
        let mut roles = HashMap::new();

        // User: own content and own billing
        let mut user = HashSet::new();
        user.insert(Permission::ContentRead);
        user.insert(Permission::ContentWrite);
        user.insert(Permission::BillingView);
        user.insert(Permission::BillingManage);
        roles.insert(UserRole::User, user.clone());

        // Admin: everything a user has, plus organisation management
        let mut admin = user;
        admin.insert(Permission::AnalyticsView);
        admin.insert(Permission::UsersManage);
        admin.insert(Permission::DataExport);
        roles.insert(UserRole::Admin, admin.clone());

        // Super admin: everything
        let mut super_admin = admin;
        super_admin.insert(Permission::ApiAccess);
        super_admin.insert(Permission::RateLimitsManage);
        super_admin.insert(Permission::SystemManage);
        roles.insert(UserRole::SuperAdmin, super_admin);

        let mut plans = HashMap::new();
        plans.insert(Plan::Free, HashSet::new());

        let mut pro = HashSet::new();
        pro.insert(Permission::DataExport);
        pro.insert(Permission::ApiAccess);
        plans.insert(Plan::Pro, pro.clone());

        let mut enterprise = pro;
        enterprise.insert(Permission::AnalyticsView);
        plans.insert(Plan::Enterprise, enterprise);

        Self { roles, plans }
    }

    /// Derive the permission set of a `(role, plan)` pair.
    ///
    /// Pure: the same inputs always produce an equal set.
    pub fn derive_permissions(&self, role: UserRole, plan: Plan) -> PermissionSet {
        let mut set = PermissionSet::new();
        if let Some(grants) = self.roles.get(&role) {
            set.extend(grants.iter().copied());
        }
        if let Some(grants) = self.plans.get(&plan) {
            set.extend(grants.iter().copied());
        }
        set
    }
}

impl Default for RbacPolicies {
    fn default() -> Self {
        Self::new()
    }
}
