//! Fixed-window rate limiting over the shared counter store.

pub mod clock;
pub mod limiter;
pub mod window;

#[cfg(test)]
pub use clock::ManualClock;
pub use clock::{Clock, SystemClock};
pub use limiter::{RateLimitOptions, RateLimitResult, RateLimiter};
pub use window::WindowSize;
