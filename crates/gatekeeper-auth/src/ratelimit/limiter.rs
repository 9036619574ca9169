//! Fixed-window rate limiter.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tracing::{debug, warn};

use gatekeeper_cache::keys;
use gatekeeper_core::error::AppError;
use gatekeeper_core::result::AppResult;
use gatekeeper_core::traits::cache::CacheProvider;

use super::clock::{Clock, SystemClock};
use super::window::WindowSize;

/// A request budget: `requests` per `window`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitOptions {
    pub requests: u64,
    pub window: WindowSize,
}

impl RateLimitOptions {
    pub fn new(requests: u64, window: WindowSize) -> Self {
        Self { requests, window }
    }

    fn validate(&self) -> AppResult<()> {
        if self.requests == 0 {
            return Err(AppError::validation(
                "Rate limit must allow at least one request per window",
            ));
        }
        Ok(())
    }
}

/// Outcome of a rate-limit check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RateLimitResult {
    /// Whether the request is within budget.
    pub success: bool,
    /// Requests left in the current window.
    pub remaining: u64,
    /// Epoch milliseconds at which the current window ends.
    pub reset: i64,
}

/// Counts requests per key in aligned fixed windows.
///
/// Store failures and timeouts fail open: the request is admitted and a
/// warning is logged.
#[derive(Debug, Clone)]
pub struct RateLimiter {
    store: Arc<dyn CacheProvider>,
    clock: Arc<dyn Clock>,
    command_timeout: Duration,
}

impl RateLimiter {
    /// Creates a limiter using wall-clock time.
    pub fn new(store: Arc<dyn CacheProvider>, command_timeout: Duration) -> Self {
        Self::with_clock(store, Arc::new(SystemClock), command_timeout)
    }

    /// Creates a limiter with an explicit time source.
    pub fn with_clock(
        store: Arc<dyn CacheProvider>,
        clock: Arc<dyn Clock>,
        command_timeout: Duration,
    ) -> Self {
        Self {
            store,
            clock,
            command_timeout,
        }
    }

    /// Count one request against `key` and report whether it is admitted.
    pub async fn limit(&self, key: &str, options: &RateLimitOptions) -> AppResult<RateLimitResult> {
        options.validate()?;
        let now = self.clock.now_millis();
        let window_ms = options.window.as_millis();
        let window_start = window_start(now, window_ms);
        let counter_key = keys::rate_limit_window(key, window_start);

        let counted = tokio::time::timeout(
            self.command_timeout,
            self.store
                .incr_with_expiry(&counter_key, options.window.as_duration()),
        )
        .await;

        let count = match counted {
            Ok(Ok(count)) => count.max(0) as u64,
            Ok(Err(e)) => {
                warn!(key, error = %e, "Rate limit store failed, allowing request");
                return Ok(fail_open_limit(now, options));
            }
            Err(_) => {
                warn!(
                    key,
                    timeout_ms = self.command_timeout.as_millis() as u64,
                    "Rate limit store timed out, allowing request"
                );
                return Ok(fail_open_limit(now, options));
            }
        };

        let result = RateLimitResult {
            success: count <= options.requests,
            remaining: options.requests.saturating_sub(count),
            reset: window_start + window_ms,
        };
        if !result.success {
            debug!(key, count, limit = options.requests, "Rate limit exceeded");
        }
        Ok(result)
    }

    /// Report the current window's standing without counting a request.
    pub async fn status(&self, key: &str, options: &RateLimitOptions) -> AppResult<RateLimitResult> {
        options.validate()?;
        let now = self.clock.now_millis();
        let window_ms = options.window.as_millis();
        let window_start = window_start(now, window_ms);
        let counter_key = keys::rate_limit_window(key, window_start);

        let read = tokio::time::timeout(self.command_timeout, self.store.get(&counter_key)).await;
        let count = match read {
            Ok(Ok(value)) => value
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(0)
                .max(0) as u64,
            Ok(Err(e)) => {
                warn!(key, error = %e, "Rate limit store failed during status check");
                return Ok(fail_open_status(window_start, window_ms, options));
            }
            Err(_) => {
                warn!(key, "Rate limit store timed out during status check");
                return Ok(fail_open_status(window_start, window_ms, options));
            }
        };

        Ok(RateLimitResult {
            success: count < options.requests,
            remaining: options.requests.saturating_sub(count),
            reset: window_start + window_ms,
        })
    }

    /// Remove every window counter for `key`. Returns the number removed.
    ///
    /// Unlike `limit`, store failures are returned to the caller.
    pub async fn clear(&self, key: &str) -> AppResult<u64> {
        let pattern = keys::rate_limit_pattern(key);
        let removed = tokio::time::timeout(self.command_timeout, self.store.delete_pattern(&pattern))
            .await
            .map_err(|_| AppError::timeout(format!("Clearing rate limit '{key}' timed out")))??;
        debug!(key, removed, "Cleared rate limit counters");
        Ok(removed)
    }
}

fn window_start(now_ms: i64, window_ms: i64) -> i64 {
    now_ms.div_euclid(window_ms) * window_ms
}

fn fail_open_limit(now: i64, options: &RateLimitOptions) -> RateLimitResult {
    RateLimitResult {
        success: true,
        remaining: options.requests.saturating_sub(1),
        reset: now + options.window.as_millis(),
    }
}

fn fail_open_status(window_start: i64, window_ms: i64, options: &RateLimitOptions) -> RateLimitResult {
    RateLimitResult {
        success: true,
        remaining: options.requests,
        reset: window_start + window_ms,
    }
}
