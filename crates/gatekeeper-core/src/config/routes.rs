//! Protected route table configuration.
//!
//! Entries are kept in declaration order; the first entry whose `path` is a
//! prefix of the request path applies.

use serde::{Deserialize, Serialize};

/// One `[[routes]]` entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteRuleConfig {
    /// Path prefix this rule protects.
    pub path: String,
    /// Roles allowed through. `None` means any authenticated session.
    #[serde(default)]
    pub roles: Option<Vec<String>>,
    /// Optional fixed-window budget.
    #[serde(default)]
    pub rate_limit: Option<RateLimitConfig>,
}

/// Requests allowed per window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Requests admitted per window.
    pub requests: u64,
    /// Window length, as `"60s"`/`"1m"`/`"1h"`/`"1d"` or integer seconds.
    pub window: WindowSpec,
}

/// Window length as written in configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WindowSpec {
    /// Raw seconds.
    Seconds(u64),
    /// Unit-suffixed duration string.
    Text(String),
}

impl WindowSpec {
    /// Canonical unit-suffixed form. Integer seconds become `"<n>s"`.
    pub fn canonical(&self) -> String {
        match self {
            Self::Seconds(secs) => format!("{secs}s"),
            Self::Text(text) => text.trim().to_string(),
        }
    }
}

fn rule(path: &str, roles: &[&str], requests: u64, window: &str) -> RouteRuleConfig {
    RouteRuleConfig {
        path: path.to_string(),
        roles: Some(roles.iter().map(|r| r.to_string()).collect()),
        rate_limit: Some(RateLimitConfig {
            requests,
            window: WindowSpec::Text(window.to_string()),
        }),
    }
}

/// Route table used when configuration provides none.
pub fn default_routes() -> Vec<RouteRuleConfig> {
    vec![
        rule("/app", &["USER", "ADMIN", "SUPER_ADMIN"], 100, "60s"),
        rule("/dashboard", &["USER", "ADMIN", "SUPER_ADMIN"], 50, "60s"),
        rule("/admin", &["ADMIN", "SUPER_ADMIN"], 100, "60s"),
        rule("/settings", &["USER", "ADMIN", "SUPER_ADMIN"], 200, "1h"),
    ]
}
