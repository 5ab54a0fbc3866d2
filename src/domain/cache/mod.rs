//! Cache domain - tiers, keys and expiration

mod clock;
mod entry;
mod key;
mod store;
mod tier;

pub use clock::{Clock, SystemClock};
pub use entry::{CacheEntry, CacheSource, ExpireTime, Payload};
pub use key::{CacheKey, CacheKeyGenerator, DefaultKeyGenerator, FnKeyGenerator, RequestParams};
pub use store::KeyValueStore;
pub use tier::CacheTier;

#[cfg(test)]
pub use clock::mock::ManualClock;
#[cfg(test)]
pub use store::MockKeyValueStore;
