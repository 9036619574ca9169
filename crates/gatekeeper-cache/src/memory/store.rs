//! In-memory counter store backed by dashmap.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::time::Instant;
use tracing::debug;

use gatekeeper_core::config::cache::MemoryCacheConfig;
use gatekeeper_core::result::AppResult;
use gatekeeper_core::traits::cache::CacheProvider;

#[derive(Debug, Clone, Copy)]
struct Counter {
    count: i64,
    expires_at: Instant,
}

/// In-memory counter store.
///
/// Counters live in a `DashMap` so that the increment and the expiry of a
/// key are decided under the same shard lock. Expired counters are dropped
/// on read and swept every `sweep_every` increments.
#[derive(Debug, Clone)]
pub struct MemoryCacheProvider {
    counters: Arc<DashMap<String, Counter>>,
    ops: Arc<AtomicU64>,
    sweep_every: u64,
}

impl MemoryCacheProvider {
    /// Create a new in-memory store from configuration.
    pub fn new(config: &MemoryCacheConfig) -> Self {
        Self {
            counters: Arc::new(DashMap::new()),
            ops: Arc::new(AtomicU64::new(0)),
            sweep_every: config.sweep_every.max(1),
        }
    }

    fn live_counter(&self, key: &str) -> Option<i64> {
        let now = Instant::now();
        self.counters
            .get(key)
            .filter(|c| c.expires_at > now)
            .map(|c| c.count)
    }

    fn sweep_if_due(&self) {
        let every = self.sweep_every;
        if self.ops.fetch_add(1, Ordering::Relaxed) % every == every - 1 {
            let now = Instant::now();
            self.counters.retain(|_, c| c.expires_at > now);
        }
    }
}

/// Split a glob into the literal runs between unescaped `*`s.
///
/// A backslash makes the next character literal, the way Redis reads it.
fn literal_segments(pattern: &str) -> Vec<String> {
    let mut segments = Vec::new();
    let mut current = String::new();
    let mut chars = pattern.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                if let Some(next) = chars.next() {
                    current.push(next);
                }
            }
            '*' => segments.push(std::mem::take(&mut current)),
            other => current.push(other),
        }
    }
    segments.push(current);
    segments
}

/// Match a key against a glob whose only wildcard is `*`.
fn glob_match(pattern: &str, key: &str) -> bool {
    let parts = literal_segments(pattern);
    let (first, rest_parts) = match parts.split_first() {
        Some(split) => split,
        None => return key.is_empty(),
    };
    let Some((last, middle)) = rest_parts.split_last() else {
        return first == key;
    };

    let Some(mut rest) = key.strip_prefix(first.as_str()) else {
        return false;
    };
    for segment in middle {
        match rest.find(segment.as_str()) {
            Some(pos) => rest = &rest[pos + segment.len()..],
            None => return false,
        }
    }
    rest.ends_with(last.as_str())
}

#[async_trait]
impl CacheProvider for MemoryCacheProvider {
    async fn get(&self, key: &str) -> AppResult<Option<String>> {
        Ok(self.live_counter(key).map(|count| count.to_string()))
    }

    async fn delete_pattern(&self, pattern: &str) -> AppResult<u64> {
        let now = Instant::now();
        let mut count = 0u64;

        let keys: Vec<String> = self
            .counters
            .iter()
            .filter(|entry| glob_match(pattern, entry.key()))
            .map(|entry| entry.key().clone())
            .collect();
        for key in keys {
            if let Some((_, counter)) = self.counters.remove(&key) {
                if counter.expires_at > now {
                    count += 1;
                }
            }
        }

        debug!(pattern, count, "Deleted keys matching pattern");
        Ok(count)
    }

    async fn incr_with_expiry(&self, key: &str, ttl: Duration) -> AppResult<i64> {
        self.sweep_if_due();
        let now = Instant::now();

        let mut entry = self.counters.entry(key.to_string()).or_insert(Counter {
            count: 0,
            expires_at: now + ttl,
        });
        if entry.expires_at <= now {
            *entry = Counter {
                count: 0,
                expires_at: now + ttl,
            };
        }
        entry.count += 1;
        Ok(entry.count)
    }

    async fn health_check(&self) -> AppResult<bool> {
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::{rate_limit_pattern, rate_limit_window};

    fn make_provider() -> MemoryCacheProvider {
        let config = MemoryCacheConfig { sweep_every: 4 };
        MemoryCacheProvider::new(&config)
    }

    #[tokio::test]
    async fn test_get_missing_key() {
        let provider = make_provider();
        assert_eq!(provider.get("nothing").await.unwrap(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweep_drops_expired_counters() {
        let provider = make_provider();
        provider
            .incr_with_expiry("old", Duration::from_secs(1))
            .await
            .unwrap();
        tokio::time::advance(Duration::from_secs(2)).await;

        for _ in 0..4 {
            provider
                .incr_with_expiry("fresh", Duration::from_secs(60))
                .await
                .unwrap();
        }
        assert!(!provider.counters.contains_key("old"));
        assert!(provider.counters.contains_key("fresh"));
    }

    #[tokio::test]
    async fn test_incr_counts_and_reads_back() {
        let provider = make_provider();
        let ttl = Duration::from_secs(60);
        assert_eq!(provider.incr_with_expiry("c", ttl).await.unwrap(), 1);
        assert_eq!(provider.incr_with_expiry("c", ttl).await.unwrap(), 2);
        assert_eq!(provider.get("c").await.unwrap(), Some("2".to_string()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_counter_expires_after_ttl() {
        let provider = make_provider();
        let ttl = Duration::from_secs(10);
        provider.incr_with_expiry("c", ttl).await.unwrap();
        provider.incr_with_expiry("c", ttl).await.unwrap();

        tokio::time::advance(Duration::from_secs(11)).await;
        assert_eq!(provider.get("c").await.unwrap(), None);
        assert_eq!(provider.incr_with_expiry("c", ttl).await.unwrap(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_later_incr_keeps_original_expiry() {
        let provider = make_provider();
        provider
            .incr_with_expiry("c", Duration::from_secs(10))
            .await
            .unwrap();
        tokio::time::advance(Duration::from_secs(8)).await;
        provider
            .incr_with_expiry("c", Duration::from_secs(10))
            .await
            .unwrap();

        tokio::time::advance(Duration::from_secs(3)).await;
        assert_eq!(provider.get("c").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_concurrent_increments_are_not_lost() {
        let provider = make_provider();
        let ttl = Duration::from_secs(60);
        let tasks = (0..50).map(|_| {
            let p = provider.clone();
            async move { p.incr_with_expiry("shared", ttl).await.unwrap() }
        });
        let mut results = futures::future::join_all(tasks).await;
        results.sort_unstable();
        assert_eq!(results, (1..=50).collect::<Vec<i64>>());
    }

    #[tokio::test]
    async fn test_delete_pattern_only_matching_keys() {
        let provider = make_provider();
        let ttl = Duration::from_secs(60);
        provider.incr_with_expiry("ratelimit:a:/app:1000", ttl).await.unwrap();
        provider.incr_with_expiry("ratelimit:a:/app:2000", ttl).await.unwrap();
        provider.incr_with_expiry("ratelimit:b:/app:1000", ttl).await.unwrap();

        let removed = provider.delete_pattern("ratelimit:a:/app:*").await.unwrap();
        assert_eq!(removed, 2);
        assert_eq!(
            provider.get("ratelimit:b:/app:1000").await.unwrap(),
            Some("1".to_string())
        );
    }

    #[tokio::test]
    async fn test_delete_pattern_with_glob_characters_in_key() {
        let provider = make_provider();
        let ttl = Duration::from_secs(60);
        provider.incr_with_expiry(&rate_limit_window("a?:/app", 1000), ttl).await.unwrap();
        provider.incr_with_expiry(&rate_limit_window("ab:/app", 1000), ttl).await.unwrap();
        provider.incr_with_expiry(&rate_limit_window("[::1]:/app", 1000), ttl).await.unwrap();
        provider.incr_with_expiry(&rate_limit_window("1:/app", 1000), ttl).await.unwrap();
        provider.incr_with_expiry(&rate_limit_window("x*:/app", 1000), ttl).await.unwrap();
        provider.incr_with_expiry(&rate_limit_window("xy:/app", 1000), ttl).await.unwrap();

        assert_eq!(provider.delete_pattern(&rate_limit_pattern("a?:/app")).await.unwrap(), 1);
        assert_eq!(provider.delete_pattern(&rate_limit_pattern("[::1]:/app")).await.unwrap(), 1);
        assert_eq!(provider.delete_pattern(&rate_limit_pattern("x*:/app")).await.unwrap(), 1);

        for survivor in ["ab:/app", "1:/app", "xy:/app"] {
            assert_eq!(
                provider.get(&rate_limit_window(survivor, 1000)).await.unwrap(),
                Some("1".to_string()),
                "{survivor} should survive"
            );
        }
    }

    #[test]
    fn test_glob_match() {
        assert!(glob_match("ratelimit:*", "ratelimit:x:1"));
        assert!(glob_match("a*c*e", "abcde"));
        assert!(glob_match("exact", "exact"));
        assert!(!glob_match("exact", "exactly"));
        assert!(!glob_match("ratelimit:a:*", "ratelimit:b:1"));
        assert!(!glob_match("a*a", "a"));
        assert!(glob_match(r"a\?:*", "a?:1"));
        assert!(!glob_match(r"a\?:*", "ab:1"));
        assert!(glob_match(r"x\*y", "x*y"));
        assert!(!glob_match(r"x\*y", "xzy"));
    }
}
