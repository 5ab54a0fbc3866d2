//! In-memory cache tier using moka

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use moka::future::Cache as MokaCache;

use crate::domain::cache::{
    CacheEntry, CacheKey, CacheSource, CacheTier, Clock, Payload, SystemClock,
};
use crate::domain::DomainError;

/// Configuration for the in-memory tier
#[derive(Debug, Clone)]
pub struct MemoryTierConfig {
    /// Maximum number of entries before least-recently-used eviction
    pub max_capacity: u64,
    /// Entries not accessed for this duration are evicted
    pub time_to_idle: Option<Duration>,
}

impl Default for MemoryTierConfig {
    fn default() -> Self {
        Self {
            max_capacity: 10_000,
            time_to_idle: None,
        }
    }
}

impl MemoryTierConfig {
    pub fn with_max_capacity(mut self, capacity: u64) -> Self {
        self.max_capacity = capacity;
        self
    }

    pub fn with_time_to_idle(mut self, tti: Duration) -> Self {
        self.time_to_idle = Some(tti);
        self
    }
}

/// Thread-safe memory tier
///
/// moka provides the concurrent map and capacity eviction. No expiration is
/// configured on moka; freshness is decided per read from the caller's TTL.
#[derive(Debug)]
pub struct MemoryTier {
    cache: MokaCache<CacheKey, CacheEntry>,
    config: MemoryTierConfig,
    clock: Arc<dyn Clock>,
}

impl MemoryTier {
    pub fn new() -> Self {
        Self::with_config(MemoryTierConfig::default())
    }

    pub fn with_config(config: MemoryTierConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    pub fn with_clock(config: MemoryTierConfig, clock: Arc<dyn Clock>) -> Self {
        let mut builder = MokaCache::builder().max_capacity(config.max_capacity);

        if let Some(tti) = config.time_to_idle {
            builder = builder.time_to_idle(tti);
        }

        Self {
            cache: builder.build(),
            config,
            clock,
        }
    }

    pub fn config(&self) -> &MemoryTierConfig {
        &self.config
    }
}

impl Default for MemoryTier {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CacheTier for MemoryTier {
    fn source(&self) -> CacheSource {
        CacheSource::Memory
    }

    fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    async fn load(&self, key: &CacheKey) -> Result<Option<CacheEntry>, DomainError> {
        Ok(self.cache.get(key).await)
    }

    async fn put(&self, key: &CacheKey, payload: Payload) -> Result<(), DomainError> {
        let entry = CacheEntry::new(key.clone(), payload, self.clock.now());
        self.cache.insert(key.clone(), entry).await;
        Ok(())
    }

    async fn delete(&self, key: &CacheKey) -> Result<(), DomainError> {
        self.cache.invalidate(key).await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::cache::{ExpireTime, ManualClock};
    use serde_json::json;

    fn tier_with_clock() -> (MemoryTier, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new());
        let tier = MemoryTier::with_clock(MemoryTierConfig::default(), clock.clone());
        (tier, clock)
    }

    #[tokio::test]
    async fn test_put_and_get() {
        let (tier, clock) = tier_with_clock();
        let key = CacheKey::new("key1");

        tier.put(&key, json!({"name": "value1"})).await.unwrap();

        let outcome = tier.get(&key, ExpireTime::Never).await;
        assert_eq!(outcome.source, CacheSource::Memory);
        assert_eq!(outcome.payload, Some(json!({"name": "value1"})));
        assert_eq!(outcome.cached_at, Some(clock.now()));
    }

    #[tokio::test]
    async fn test_get_missing() {
        let tier = MemoryTier::new();

        let outcome = tier.get(&CacheKey::new("missing"), ExpireTime::Never).await;
        assert!(outcome.is_miss());
    }

    #[tokio::test]
    async fn test_delete() {
        let tier = MemoryTier::new();
        let key = CacheKey::new("key1");

        tier.put(&key, json!("value1")).await.unwrap();
        tier.delete(&key).await.unwrap();

        assert!(!tier.exists(&key, ExpireTime::Never).await);
    }

    #[tokio::test]
    async fn test_delete_missing_is_noop() {
        let tier = MemoryTier::new();

        assert!(tier.delete(&CacheKey::new("missing")).await.is_ok());
    }

    #[tokio::test]
    async fn test_ttl_is_judged_at_read_time() {
        let (tier, clock) = tier_with_clock();
        let key = CacheKey::new("key1");

        tier.put(&key, json!("value1")).await.unwrap();
        clock.advance_secs(59);
        assert!(tier.exists(&key, ExpireTime::seconds(60)).await);

        clock.advance_secs(2);
        assert!(!tier.exists(&key, ExpireTime::seconds(60)).await);

        // Stale under one ttl, still present and fresh under a longer one
        assert!(tier.exists(&key, ExpireTime::seconds(3600)).await);
        assert!(tier.exists(&key, ExpireTime::Never).await);
        assert!(!tier.exists(&key, ExpireTime::Always).await);
    }

    #[tokio::test]
    async fn test_put_overwrites_and_restamps() {
        let (tier, clock) = tier_with_clock();
        let key = CacheKey::new("key1");

        tier.put(&key, json!(1)).await.unwrap();
        clock.advance_secs(100);
        tier.put(&key, json!(2)).await.unwrap();

        let entry = tier.load(&key).await.unwrap().unwrap();
        assert_eq!(entry.payload, json!(2));
        assert_eq!(entry.stored_at, clock.now());
    }

    #[tokio::test]
    async fn test_concurrent_writers() {
        let tier = Arc::new(MemoryTier::new());

        let handles: Vec<_> = (0..16)
            .map(|i| {
                let tier = tier.clone();
                tokio::spawn(async move {
                    tier.put(&CacheKey::new(format!("key{}", i % 4)), json!(i))
                        .await
                        .unwrap();
                })
            })
            .collect();

        for handle in handles {
            handle.await.unwrap();
        }

        for i in 0..4 {
            assert!(
                tier.exists(&CacheKey::new(format!("key{}", i)), ExpireTime::Never)
                    .await
            );
        }
    }

    #[test]
    fn test_config() {
        let config = MemoryTierConfig::default()
            .with_max_capacity(100)
            .with_time_to_idle(Duration::from_secs(60));

        let tier = MemoryTier::with_config(config);

        assert_eq!(tier.config().max_capacity, 100);
        assert_eq!(tier.config().time_to_idle, Some(Duration::from_secs(60)));
    }
}
