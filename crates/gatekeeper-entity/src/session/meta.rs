//! Client metadata extracted from an inbound request.

use serde::{Deserialize, Serialize};

/// Caller identity hints used for last-seen tracking and rate-limit keys.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestMeta {
    /// Client IP, when one could be determined.
    pub ip: Option<String>,
    /// Raw User-Agent header.
    pub user_agent: Option<String>,
}

impl RequestMeta {
    pub fn new(ip: Option<String>, user_agent: Option<String>) -> Self {
        Self { ip, user_agent }
    }
}
