//! Cache manager that dispatches to the configured provider.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::info;

use gatekeeper_core::config::cache::CacheConfig;
use gatekeeper_core::error::AppError;
use gatekeeper_core::result::AppResult;
use gatekeeper_core::traits::cache::CacheProvider;

/// Cache manager that wraps the configured cache provider.
///
/// The provider is selected at construction time based on configuration.
#[derive(Debug, Clone)]
pub struct CacheManager {
    inner: Arc<dyn CacheProvider>,
    provider_name: &'static str,
}

impl CacheManager {
    /// Create a new cache manager from configuration.
    pub async fn new(config: &CacheConfig) -> AppResult<Self> {
        let (inner, provider_name): (Arc<dyn CacheProvider>, &'static str) =
            match config.provider.as_str() {
                #[cfg(feature = "redis-backend")]
                "redis" => {
                    info!("Initializing Redis counter store");
                    let client = crate::redis::RedisClient::connect(&config.redis).await?;
                    (Arc::new(crate::redis::RedisCacheProvider::new(client)), "redis")
                }
                #[cfg(feature = "memory")]
                "memory" => {
                    info!("Initializing in-memory counter store");
                    (
                        Arc::new(crate::memory::MemoryCacheProvider::new(&config.memory)),
                        "memory",
                    )
                }
                other => {
                    return Err(AppError::configuration(format!(
                        "Unknown cache provider: '{other}'. Supported: memory, redis"
                    )));
                }
            };

        Ok(Self {
            inner,
            provider_name,
        })
    }

    /// Create a cache manager from an existing provider (for testing).
    pub fn from_provider(provider: Arc<dyn CacheProvider>) -> Self {
        Self {
            inner: provider,
            provider_name: "custom",
        }
    }

    /// Name of the active backend.
    pub fn provider_name(&self) -> &'static str {
        self.provider_name
    }
}

#[async_trait]
impl CacheProvider for CacheManager {
    async fn get(&self, key: &str) -> AppResult<Option<String>> {
        self.inner.get(key).await
    }

    async fn delete_pattern(&self, pattern: &str) -> AppResult<u64> {
        self.inner.delete_pattern(pattern).await
    }

    async fn incr_with_expiry(&self, key: &str, ttl: Duration) -> AppResult<i64> {
        self.inner.incr_with_expiry(key, ttl).await
    }

    async fn health_check(&self) -> AppResult<bool> {
        self.inner.health_check().await
    }
}
