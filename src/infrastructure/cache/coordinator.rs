//! Two-level response cache: memory in front of disk

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, warn};

use super::disk::DiskTier;
use super::file_store::FileStore;
use super::in_memory::{MemoryTier, MemoryTierConfig};
use crate::domain::cache::{
    CacheKey, CacheKeyGenerator, CacheSource, CacheTier, Clock, DefaultKeyGenerator, ExpireTime,
    Payload, RequestParams, SystemClock,
};
use crate::domain::fetch::FetchOutcome;
use crate::domain::transport::Endpoint;
use crate::domain::DomainError;
use crate::infrastructure::observability::metrics;

/// Which tiers a write or delete applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteTargets {
    pub memory: bool,
    pub disk: bool,
}

impl WriteTargets {
    pub const BOTH: Self = Self {
        memory: true,
        disk: true,
    };
    pub const MEMORY: Self = Self {
        memory: true,
        disk: false,
    };
    pub const DISK: Self = Self {
        memory: false,
        disk: true,
    };
    pub const NONE: Self = Self {
        memory: false,
        disk: false,
    };

    pub fn new(memory: bool, disk: bool) -> Self {
        Self { memory, disk }
    }
}

impl Default for WriteTargets {
    fn default() -> Self {
        Self::BOTH
    }
}

/// Logical cache composed of a memory tier and a disk tier
///
/// Reads consult memory first and fall back to disk; a disk hit is not
/// promoted into memory. Writes and deletes address each tier independently.
#[derive(Debug, Clone)]
pub struct ResponseCache {
    namespace: String,
    memory: Arc<dyn CacheTier>,
    disk: Arc<dyn CacheTier>,
    key_generator: Arc<dyn CacheKeyGenerator>,
    write_targets: WriteTargets,
}

impl ResponseCache {
    /// Creates a cache from explicit tiers
    pub fn new(
        namespace: impl Into<String>,
        memory: Arc<dyn CacheTier>,
        disk: Arc<dyn CacheTier>,
    ) -> Self {
        Self {
            namespace: namespace.into(),
            memory,
            disk,
            key_generator: Arc::new(DefaultKeyGenerator::new()),
            write_targets: WriteTargets::BOTH,
        }
    }

    /// Opens a cache whose disk tier lives in `{directory}/{namespace}`
    pub fn open(namespace: &str, directory: &Path) -> Result<Self, DomainError> {
        Self::open_with(
            namespace,
            directory,
            MemoryTierConfig::default(),
            Arc::new(SystemClock),
        )
    }

    pub fn open_with(
        namespace: &str,
        directory: &Path,
        memory_config: MemoryTierConfig,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, DomainError> {
        validate_namespace(namespace)?;

        let store = Arc::new(FileStore::new(directory.join(namespace)));
        let memory = Arc::new(MemoryTier::with_clock(memory_config, clock.clone()));
        let disk = Arc::new(DiskTier::with_clock(store, clock));

        Ok(Self::new(namespace, memory, disk))
    }

    pub fn with_key_generator(mut self, generator: Arc<dyn CacheKeyGenerator>) -> Self {
        self.key_generator = generator;
        self
    }

    /// Sets the tiers written after a successful network response
    pub fn with_write_targets(mut self, targets: WriteTargets) -> Self {
        self.write_targets = targets;
        self
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn key_generator(&self) -> &dyn CacheKeyGenerator {
        self.key_generator.as_ref()
    }

    pub fn write_targets(&self) -> WriteTargets {
        self.write_targets
    }

    pub fn key_for(&self, endpoint: &Endpoint, params: &RequestParams) -> CacheKey {
        self.key_generator.generate(endpoint, params)
    }

    /// Whether a fresh entry exists in memory or on disk
    pub async fn exists(&self, key: &CacheKey, ttl: ExpireTime) -> bool {
        self.memory_exists(key, ttl).await || self.disk_exists(key, ttl).await
    }

    pub async fn memory_exists(&self, key: &CacheKey, ttl: ExpireTime) -> bool {
        self.memory.exists(key, ttl).await
    }

    pub async fn disk_exists(&self, key: &CacheKey, ttl: ExpireTime) -> bool {
        self.disk.exists(key, ttl).await
    }

    /// Looks the key up in memory, then on disk
    ///
    /// Returns a miss outcome when neither tier holds a fresh entry.
    pub async fn get(&self, key: &CacheKey, ttl: ExpireTime) -> FetchOutcome {
        for tier in [&self.memory, &self.disk] {
            let outcome = tier.get(key, ttl).await;
            let hit = outcome.is_hit();
            metrics::record_cache_lookup(tier.source(), hit);

            if hit {
                debug!(namespace = %self.namespace, key = %key, tier = %tier.source(), "Cache hit");
                return outcome;
            }
        }

        debug!(namespace = %self.namespace, key = %key, "Cache miss");
        FetchOutcome::miss()
    }

    /// Looks up the entry for a request identity
    pub async fn fetch(
        &self,
        endpoint: &Endpoint,
        params: &RequestParams,
        ttl: ExpireTime,
    ) -> FetchOutcome {
        self.get(&self.key_for(endpoint, params), ttl).await
    }

    /// Writes `payload` to the selected tiers
    ///
    /// Failures are logged and counted, never returned.
    pub async fn put(&self, key: &CacheKey, payload: Payload, targets: WriteTargets) {
        if targets.memory {
            self.write_tier(&self.memory, key, payload.clone()).await;
        }

        if targets.disk {
            self.write_tier(&self.disk, key, payload).await;
        }
    }

    /// Writes `payload` to the configured default tiers
    pub async fn store(&self, key: &CacheKey, payload: Payload) {
        self.put(key, payload, self.write_targets).await;
    }

    /// Deletes the entry from the selected tiers
    pub async fn delete(&self, key: &CacheKey, targets: WriteTargets) {
        if targets.memory {
            self.delete_tier(&self.memory, key).await;
        }

        if targets.disk {
            self.delete_tier(&self.disk, key).await;
        }
    }

    /// Deletes the entry from both tiers
    pub async fn remove(&self, key: &CacheKey) {
        self.delete(key, WriteTargets::BOTH).await;
    }

    async fn write_tier(&self, tier: &Arc<dyn CacheTier>, key: &CacheKey, payload: Payload) {
        if let Err(e) = tier.put(key, payload).await {
            warn!(
                namespace = %self.namespace,
                key = %key,
                tier = %tier.source(),
                error = %e,
                "Failed to write cache entry"
            );
            metrics::record_cache_write_failure(tier.source(), "put");
        }
    }

    async fn delete_tier(&self, tier: &Arc<dyn CacheTier>, key: &CacheKey) {
        if let Err(e) = tier.delete(key).await {
            warn!(
                namespace = %self.namespace,
                key = %key,
                tier = %tier.source(),
                error = %e,
                "Failed to delete cache entry"
            );
            metrics::record_cache_write_failure(tier.source(), "delete");
        }
    }
}

/// Platform cache directory used when none is configured
pub fn default_cache_dir() -> PathBuf {
    dirs::cache_dir()
        .or_else(dirs::home_dir)
        .unwrap_or_else(std::env::temp_dir)
        .join("pmp-fetch-cache")
}

fn validate_namespace(namespace: &str) -> Result<(), DomainError> {
    if namespace.is_empty() {
        return Err(DomainError::validation("Cache namespace must not be empty"));
    }

    let valid = namespace
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
        && namespace != "."
        && namespace != "..";

    if !valid {
        return Err(DomainError::validation(format!(
            "Invalid cache namespace: {}. Use letters, digits, '-', '_' or '.'",
            namespace
        )));
    }

    Ok(())
}
