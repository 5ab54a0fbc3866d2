//! PMP Fetch Cache
//!
//! A two-level response cache sitting between callers and remote HTTP
//! endpoints:
//! - Memory tier (moka) in front of a persistent disk tier
//! - TTL judged at read time, with `Never` and `Always` sentinels
//! - Fetch strategies deciding between cache and network per request
//! - Post-fetch cache maintenance (suppressed updates, delete after use)

pub mod cli;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::AppConfig;
pub use domain::{
    CacheKey, CacheSource, DomainError, Endpoint, ExpireTime, FetchMode, FetchOutcome,
    FetchRequest, HttpMethod, RequestParams, Strategy, TransportError,
};
pub use infrastructure::cache::{CacheConfig, CacheFactory, ResponseCache, WriteTargets};
pub use infrastructure::services::{FetchClient, FetchCoordinator, FetchHandle};

use std::sync::Arc;

use infrastructure::transport::HttpTransport;

/// Builds a fetch client from application configuration
pub fn build_fetch_client(config: &AppConfig) -> Result<FetchClient, DomainError> {
    let cache = CacheFactory::new().create(&config.to_cache_config())?;

    let mut transport = HttpTransport::with_timeout(config.transport.timeout())?;
    if let Some(base_url) = &config.transport.base_url {
        transport = transport.with_base_url(base_url);
    }

    Ok(FetchClient::new(cache, Arc::new(transport)))
}
