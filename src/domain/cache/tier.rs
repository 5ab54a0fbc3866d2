//! Cache tier trait definition

use std::fmt::Debug;

use async_trait::async_trait;
use tracing::{debug, warn};

use super::clock::Clock;
use super::entry::{CacheEntry, CacheSource, ExpireTime, Payload};
use super::key::CacheKey;
use crate::domain::fetch::FetchOutcome;
use crate::domain::DomainError;

/// A single cache backend with TTL-aware reads
///
/// Staleness is judged at read time only: a stale entry is reported as a miss
/// but stays in the tier until it is overwritten, deleted or evicted.
#[async_trait]
pub trait CacheTier: Send + Sync + Debug {
    /// Source tag attached to entries served by this tier
    fn source(&self) -> CacheSource;

    /// Time source used for stamping and aging entries
    fn clock(&self) -> &dyn Clock;

    /// Loads the raw entry regardless of its age
    async fn load(&self, key: &CacheKey) -> Result<Option<CacheEntry>, DomainError>;

    /// Stores `payload` under `key`, stamped with the current time
    async fn put(&self, key: &CacheKey, payload: Payload) -> Result<(), DomainError>;

    /// Removes the entry; deleting a missing key is not an error
    async fn delete(&self, key: &CacheKey) -> Result<(), DomainError>;

    /// Returns the entry tagged with this tier's source if present and fresh
    ///
    /// Read failures fail open and are reported as a miss.
    async fn get(&self, key: &CacheKey, ttl: ExpireTime) -> FetchOutcome {
        match self.load(key).await {
            Ok(Some(entry)) => {
                if entry.is_fresh(ttl, self.clock().now()) {
                    FetchOutcome::cached(self.source(), entry)
                } else {
                    debug!(tier = %self.source(), key = %key, ttl = %ttl, "Cached entry is stale");
                    FetchOutcome::miss()
                }
            }
            Ok(None) => FetchOutcome::miss(),
            Err(e) => {
                warn!(tier = %self.source(), key = %key, error = %e, "Cache read failed, treating as miss");
                FetchOutcome::miss()
            }
        }
    }

    /// Whether a fresh entry exists under `key`
    async fn exists(&self, key: &CacheKey, ttl: ExpireTime) -> bool {
        self.get(key, ttl).await.is_hit()
    }
}
