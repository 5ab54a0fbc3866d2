//! Persistent key-value store backing the disk tier

use std::fmt::Debug;

use crate::domain::DomainError;

#[cfg(test)]
use mockall::automock;

/// Blocking byte store addressed by cache key
///
/// Every method may touch the file system; callers must run them on a
/// blocking worker, never on an async executor thread.
#[cfg_attr(test, automock)]
pub trait KeyValueStore: Send + Sync + Debug {
    /// Reads the bytes stored under `key`, `None` when absent
    fn read(&self, key: &str) -> Result<Option<Vec<u8>>, DomainError>;

    /// Stores `bytes` under `key`, replacing any previous value
    fn write(&self, key: &str, bytes: &[u8]) -> Result<(), DomainError>;

    /// Removes `key`; removing an absent key succeeds
    fn remove(&self, key: &str) -> Result<(), DomainError>;
}
