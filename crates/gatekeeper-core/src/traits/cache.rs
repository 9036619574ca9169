//! Counter/cache provider trait for pluggable backends.

use std::time::Duration;

use async_trait::async_trait;

use crate::result::AppResult;

/// Trait for the shared counter store (Redis or in-memory).
///
/// Keys hold integer counters that expire on their own. The provider is
/// responsible for key prefixing and TTL enforcement.
#[async_trait]
pub trait CacheProvider: Send + Sync + std::fmt::Debug + 'static {
    /// Get a value by key. Returns `None` if the key does not exist or has expired.
    async fn get(&self, key: &str) -> AppResult<Option<String>>;

    /// Delete all keys matching a glob pattern (e.g. `"ratelimit:1.2.3.4:/app:*"`).
    /// `*` is the only wildcard; a backslash escapes the next character.
    /// Returns the number of keys removed.
    async fn delete_pattern(&self, pattern: &str) -> AppResult<u64>;

    /// Increment an integer counter by 1 and return the new value.
    ///
    /// When the increment creates the key, `ttl` is applied in the same
    /// atomic step. Existing keys keep their original expiry.
    async fn incr_with_expiry(&self, key: &str, ttl: Duration) -> AppResult<i64>;

    /// Check that the backend is reachable.
    async fn health_check(&self) -> AppResult<bool>;
}
