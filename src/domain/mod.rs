//! Domain layer - cache tiers, fetch strategies and the transport seam

pub mod cache;
pub mod error;
pub mod fetch;
pub mod transport;

pub use cache::{
    CacheEntry, CacheKey, CacheKeyGenerator, CacheSource, CacheTier, Clock, DefaultKeyGenerator,
    ExpireTime, FnKeyGenerator, KeyValueStore, Payload, RequestParams, SystemClock,
};
pub use error::DomainError;
pub use fetch::{FetchMode, FetchOutcome, FetchRequest, Strategy};
pub use transport::{Endpoint, HttpMethod, Transport, TransportError};
