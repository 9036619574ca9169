//! Counter store configuration.

use serde::{Deserialize, Serialize};

/// Top-level cache configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Cache provider type: `"memory"` or `"redis"`.
    #[serde(default = "default_provider")]
    pub provider: String,
    /// Upper bound on a single store command, in milliseconds.
    #[serde(default = "default_command_timeout")]
    pub command_timeout_ms: u64,
    /// Redis-specific configuration.
    #[serde(default)]
    pub redis: RedisCacheConfig,
    /// In-memory configuration.
    #[serde(default)]
    pub memory: MemoryCacheConfig,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            command_timeout_ms: default_command_timeout(),
            redis: RedisCacheConfig::default(),
            memory: MemoryCacheConfig::default(),
        }
    }
}

/// Redis backend configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedisCacheConfig {
    /// Redis connection URL.
    #[serde(default = "default_redis_url")]
    pub url: String,
    /// Key prefix prepended to every key. Empty by default so counters live
    /// under the bare `ratelimit:` namespace.
    #[serde(default)]
    pub key_prefix: String,
}

impl Default for RedisCacheConfig {
    fn default() -> Self {
        Self {
            url: default_redis_url(),
            key_prefix: String::new(),
        }
    }
}

/// In-memory backend configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryCacheConfig {
    /// Counter increments between sweeps of expired counters.
    #[serde(default = "default_sweep_every")]
    pub sweep_every: u64,
}

impl Default for MemoryCacheConfig {
    fn default() -> Self {
        Self {
            sweep_every: default_sweep_every(),
        }
    }
}

fn default_provider() -> String {
    "memory".to_string()
}

fn default_command_timeout() -> u64 {
    500
}

fn default_redis_url() -> String {
    "redis://localhost:6379".to_string()
}

fn default_sweep_every() -> u64 {
    1024
}
