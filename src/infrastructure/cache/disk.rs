//! Persistent cache tier over a blocking key-value store

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::domain::cache::{
    CacheEntry, CacheKey, CacheSource, CacheTier, Clock, KeyValueStore, Payload, SystemClock,
};
use crate::domain::DomainError;

/// Disk tier
///
/// Entries are serialized as JSON together with their write timestamp, so TTL
/// evaluation survives process restarts. Store calls run on tokio's blocking
/// pool, never on the caller's task.
#[derive(Debug, Clone)]
pub struct DiskTier {
    store: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
}

impl DiskTier {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self::with_clock(store, Arc::new(SystemClock))
    }

    pub fn with_clock(store: Arc<dyn KeyValueStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    async fn blocking<T, F>(&self, op: F) -> Result<T, DomainError>
    where
        T: Send + 'static,
        F: FnOnce(&dyn KeyValueStore) -> Result<T, DomainError> + Send + 'static,
    {
        let store = self.store.clone();

        tokio::task::spawn_blocking(move || op(store.as_ref()))
            .await
            .map_err(|e| DomainError::internal(format!("Disk cache worker failed: {}", e)))?
    }
}

#[async_trait]
impl CacheTier for DiskTier {
    fn source(&self) -> CacheSource {
        CacheSource::Disk
    }

    fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    async fn load(&self, key: &CacheKey) -> Result<Option<CacheEntry>, DomainError> {
        let raw_key = key.as_str().to_string();
        let bytes = self.blocking(move |store| store.read(&raw_key)).await?;

        match bytes {
            Some(bytes) => {
                let entry: CacheEntry = serde_json::from_slice(&bytes).map_err(|e| {
                    DomainError::storage(format!("Failed to deserialize cache entry: {}", e))
                })?;

                // Digest collision or a foreign file in the namespace
                if &entry.key != key {
                    debug!(key = %key, stored_key = %entry.key, "Disk entry belongs to another key");
                    return Ok(None);
                }

                Ok(Some(entry))
            }
            None => Ok(None),
        }
    }

    async fn put(&self, key: &CacheKey, payload: Payload) -> Result<(), DomainError> {
        let entry = CacheEntry::new(key.clone(), payload, self.clock.now());
        let bytes = serde_json::to_vec(&entry).map_err(|e| {
            DomainError::storage(format!("Failed to serialize cache entry: {}", e))
        })?;

        let raw_key = key.as_str().to_string();
        self.blocking(move |store| store.write(&raw_key, &bytes))
            .await
    }

    async fn delete(&self, key: &CacheKey) -> Result<(), DomainError> {
        let raw_key = key.as_str().to_string();
        self.blocking(move |store| store.remove(&raw_key)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::cache::{ExpireTime, ManualClock, MockKeyValueStore};
    use crate::infrastructure::cache::FileStore;
    use serde_json::json;
    use tempfile::TempDir;

    fn create_test_tier() -> (DiskTier, Arc<ManualClock>, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let clock = Arc::new(ManualClock::new());
        let store = Arc::new(FileStore::new(temp_dir.path().join("ns")));
        (DiskTier::with_clock(store, clock.clone()), clock, temp_dir)
    }

    #[tokio::test]
    async fn test_put_and_get() {
        let (tier, clock, _temp_dir) = create_test_tier();
        let key = CacheKey::new("users");

        tier.put(&key, json!([{"id": 1}])).await.unwrap();

        let outcome = tier.get(&key, ExpireTime::Never).await;
        assert_eq!(outcome.source, CacheSource::Disk);
        assert_eq!(outcome.payload, Some(json!([{"id": 1}])));
        assert_eq!(outcome.cached_at, Some(clock.now()));
    }

    #[tokio::test]
    async fn test_entry_survives_reopen_with_original_timestamp() {
        let temp_dir = TempDir::new().unwrap();
        let clock = Arc::new(ManualClock::new());
        let written_at = clock.now();
        let key = CacheKey::new("users");

        let first = DiskTier::with_clock(
            Arc::new(FileStore::new(temp_dir.path().join("ns"))),
            clock.clone(),
        );
        first.put(&key, json!("v1")).await.unwrap();
        drop(first);

        clock.advance_secs(30);
        let reopened = DiskTier::with_clock(
            Arc::new(FileStore::new(temp_dir.path().join("ns"))),
            clock.clone(),
        );

        let entry = reopened.load(&key).await.unwrap().unwrap();
        assert_eq!(entry.stored_at, written_at);
        assert!(reopened.exists(&key, ExpireTime::seconds(60)).await);
        assert!(!reopened.exists(&key, ExpireTime::seconds(10)).await);
    }

    #[tokio::test]
    async fn test_delete() {
        let (tier, _clock, _temp_dir) = create_test_tier();
        let key = CacheKey::new("users");

        tier.put(&key, json!(1)).await.unwrap();
        tier.delete(&key).await.unwrap();
        tier.delete(&key).await.unwrap();

        assert!(tier.get(&key, ExpireTime::Never).await.is_miss());
    }

    #[tokio::test]
    async fn test_corrupt_file_fails_open() {
        let (tier, _clock, temp_dir) = create_test_tier();
        let key = CacheKey::new("users");
        let store = FileStore::new(temp_dir.path().join("ns"));

        store.write(key.as_str(), b"{not json").unwrap();

        assert!(tier.load(&key).await.is_err());
        assert!(tier.get(&key, ExpireTime::Never).await.is_miss());
    }

    #[tokio::test]
    async fn test_store_read_failure_fails_open() {
        let mut store = MockKeyValueStore::new();
        store
            .expect_read()
            .returning(|_| Err(DomainError::storage("disk unplugged")));

        let tier = DiskTier::new(Arc::new(store));

        assert!(!tier.exists(&CacheKey::new("k"), ExpireTime::Never).await);
    }

    #[tokio::test]
    async fn test_store_write_failure_is_reported() {
        let mut store = MockKeyValueStore::new();
        store
            .expect_write()
            .times(1)
            .returning(|_, _| Err(DomainError::storage("read-only file system")));

        let tier = DiskTier::new(Arc::new(store));

        let result = tier.put(&CacheKey::new("k"), json!(1)).await;
        assert!(matches!(result, Err(DomainError::Storage { .. })));
    }
}
