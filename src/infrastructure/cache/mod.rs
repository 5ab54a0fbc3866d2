//! Cache infrastructure - tier implementations and the two-level cache

mod coordinator;
mod disk;
mod factory;
mod file_store;
mod in_memory;

pub use coordinator::{default_cache_dir, ResponseCache, WriteTargets};
pub use disk::DiskTier;
pub use factory::{CacheConfig, CacheFactory};
pub use file_store::FileStore;
pub use in_memory::{MemoryTier, MemoryTierConfig};
