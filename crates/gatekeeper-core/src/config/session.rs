//! Session cookie and store configuration.

use serde::{Deserialize, Serialize};

/// Session resolution configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Primary session cookie name.
    #[serde(default = "default_cookie_name")]
    pub cookie_name: String,
    /// Fallback cookie name used behind HTTPS.
    #[serde(default = "default_secure_cookie_name")]
    pub secure_cookie_name: String,
    /// Session store backend: `"postgres"` or `"memory"`.
    #[serde(default = "default_store")]
    pub store: String,
    /// Upper bound on a single session store call, in milliseconds.
    #[serde(default = "default_store_timeout")]
    pub store_timeout_ms: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cookie_name: default_cookie_name(),
            secure_cookie_name: default_secure_cookie_name(),
            store: default_store(),
            store_timeout_ms: default_store_timeout(),
        }
    }
}

fn default_cookie_name() -> String {
    "next-auth.session-token".to_string()
}

fn default_secure_cookie_name() -> String {
    "__Secure-next-auth.session-token".to_string()
}

fn default_store() -> String {
    "postgres".to_string()
}

fn default_store_timeout() -> u64 {
    2_000
}
