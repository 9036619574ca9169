//! Outbound authenticated client configuration.

use serde::{Deserialize, Serialize};

/// Settings for the token-attaching HTTP client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Base URL the endpoints below are resolved against.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Login endpoint path.
    #[serde(default = "default_login_endpoint")]
    pub login_endpoint: String,
    /// Registration endpoint path.
    #[serde(default = "default_register_endpoint")]
    pub register_endpoint: String,
    /// Token refresh endpoint path.
    #[serde(default = "default_refresh_endpoint")]
    pub refresh_endpoint: String,
    /// Logout endpoint path.
    #[serde(default = "default_logout_endpoint")]
    pub logout_endpoint: String,
    /// Authorization scheme placed before the access token.
    #[serde(default = "default_token_type")]
    pub token_type: String,
    /// Storage key holding the access token.
    #[serde(default = "default_token_key")]
    pub storage_token_key_name: String,
    /// Storage key holding the refresh token.
    #[serde(default = "default_refresh_token_key")]
    pub storage_refresh_token_key_name: String,
    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            login_endpoint: default_login_endpoint(),
            register_endpoint: default_register_endpoint(),
            refresh_endpoint: default_refresh_endpoint(),
            logout_endpoint: default_logout_endpoint(),
            token_type: default_token_type(),
            storage_token_key_name: default_token_key(),
            storage_refresh_token_key_name: default_refresh_token_key(),
            timeout_seconds: default_timeout(),
        }
    }
}

fn default_base_url() -> String {
    "http://localhost:8080".to_string()
}

fn default_login_endpoint() -> String {
    "/jwt/login".to_string()
}

fn default_register_endpoint() -> String {
    "/jwt/register".to_string()
}

fn default_refresh_endpoint() -> String {
    "/jwt/refresh-token".to_string()
}

fn default_logout_endpoint() -> String {
    "/jwt/logout".to_string()
}

fn default_token_type() -> String {
    "Bearer".to_string()
}

fn default_token_key() -> String {
    "accessToken".to_string()
}

fn default_refresh_token_key() -> String {
    "refreshToken".to_string()
}

fn default_timeout() -> u64 {
    30
}
