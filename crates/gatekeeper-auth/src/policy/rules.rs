//! Route rules built from the `[[routes]]` configuration.

use std::collections::BTreeSet;

use tracing::info;

use gatekeeper_core::config::routes::RouteRuleConfig;
use gatekeeper_core::error::AppError;
use gatekeeper_core::result::AppResult;
use gatekeeper_entity::session::ResolvedSession;
use gatekeeper_entity::user::UserRole;

use crate::ratelimit::{RateLimitOptions, WindowSize};

/// A protected path prefix with its role and rate-limit requirements.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteRule {
    pub path: String,
    /// Allowed roles. `None` admits any valid session.
    pub roles: Option<BTreeSet<UserRole>>,
    pub rate_limit: Option<RateLimitOptions>,
}

impl RouteRule {
    /// Whether `path` falls under this rule.
    pub fn matches(&self, path: &str) -> bool {
        path.starts_with(&self.path)
    }

    /// Whether `role` passes this rule's role restriction.
    pub fn admits(&self, role: UserRole) -> bool {
        self.roles.as_ref().is_none_or(|roles| roles.contains(&role))
    }
}

/// Whether the session's role satisfies the rule.
pub fn is_authorized(rule: &RouteRule, session: &ResolvedSession) -> bool {
    rule.admits(session.role)
}

/// Ordered rule list. The first matching prefix wins.
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    rules: Vec<RouteRule>,
}

impl RouteTable {
    pub fn new(rules: Vec<RouteRule>) -> Self {
        Self { rules }
    }

    /// Build the table from configuration, rejecting unknown roles,
    /// malformed windows, and zero budgets.
    pub fn from_config(entries: &[RouteRuleConfig]) -> AppResult<Self> {
        let mut rules = Vec::with_capacity(entries.len());
        for entry in entries {
            let roles = match &entry.roles {
                Some(names) => {
                    let mut set = BTreeSet::new();
                    for name in names {
                        let role = name.parse::<UserRole>().map_err(|e| {
                            AppError::configuration(format!("Route '{}': {}", entry.path, e.message))
                        })?;
                        set.insert(role);
                    }
                    Some(set)
                }
                None => None,
            };

            let rate_limit = match &entry.rate_limit {
                Some(limit) => {
                    let window = WindowSize::parse(&limit.window.canonical()).map_err(|e| {
                        AppError::configuration(format!("Route '{}': {}", entry.path, e.message))
                    })?;
                    if limit.requests == 0 {
                        return Err(AppError::configuration(format!(
                            "Route '{}': rate limit requests must be at least 1",
                            entry.path
                        )));
                    }
                    Some(RateLimitOptions::new(limit.requests, window))
                }
                None => None,
            };

            rules.push(RouteRule {
                path: entry.path.clone(),
                roles,
                rate_limit,
            });
        }

        info!(rules = rules.len(), "Route table loaded");
        Ok(Self { rules })
    }

    /// First rule whose prefix matches `path`.
    pub fn match_rule(&self, path: &str) -> Option<&RouteRule> {
        self.rules.iter().find(|rule| rule.matches(path))
    }

    pub fn rules(&self) -> &[RouteRule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use gatekeeper_core::config::routes::{RateLimitConfig, WindowSpec, default_routes};
    use gatekeeper_core::error::ErrorKind;

    use super::*;

    fn entry(path: &str, roles: Option<&[&str]>, window: Option<WindowSpec>) -> RouteRuleConfig {
        RouteRuleConfig {
            path: path.to_string(),
            roles: roles.map(|r| r.iter().map(|s| s.to_string()).collect()),
            rate_limit: window.map(|window| RateLimitConfig {
                requests: 10,
                window,
            }),
        }
    }

    #[test]
    fn test_default_table_loads() {
        let table = RouteTable::from_config(&default_routes()).unwrap();
        assert_eq!(table.len(), 4);
        let settings = table.match_rule("/settings/profile").unwrap();
        assert_eq!(settings.rate_limit.unwrap().window.as_millis(), 3_600_000);
    }

    #[test]
    fn test_first_match_wins() {
        let table = RouteTable::from_config(&[
            entry("/admin/reports", Some(&["SUPER_ADMIN"]), None),
            entry("/admin", Some(&["ADMIN"]), None),
        ])
        .unwrap();
        assert_eq!(table.match_rule("/admin/reports/q1").unwrap().path, "/admin/reports");
        assert_eq!(table.match_rule("/admin/users").unwrap().path, "/admin");
        assert!(table.match_rule("/public").is_none());
    }

    #[test]
    fn test_integer_window_converted() {
        let table =
            RouteTable::from_config(&[entry("/app", None, Some(WindowSpec::Seconds(90)))]).unwrap();
        let limit = table.rules()[0].rate_limit.unwrap();
        assert_eq!(limit.window.to_string(), "90s");
    }

    #[test]
    fn test_bad_window_rejected() {
        let err = RouteTable::from_config(&[entry(
            "/app",
            None,
            Some(WindowSpec::Text("10x".to_string())),
        )])
        .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Configuration);
    }

    #[test]
    fn test_unknown_role_rejected() {
        let err = RouteTable::from_config(&[entry("/app", Some(&["OWNER"]), None)]).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Configuration);
        assert!(err.message.contains("/app"));
    }

    #[test]
    fn test_rule_without_roles_admits_everyone() {
        let rule = RouteRule {
            path: "/app".to_string(),
            roles: None,
            rate_limit: None,
        };
        assert!(rule.admits(UserRole::User));
        assert!(rule.admits(UserRole::SuperAdmin));
    }
}
