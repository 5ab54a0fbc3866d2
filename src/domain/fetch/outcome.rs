//! Tagged result of a fetch

use chrono::{DateTime, Utc};

use crate::domain::cache::{CacheEntry, CacheSource, Payload};
use crate::domain::transport::TransportError;

/// One delivery of a fetch
///
/// `cached_at` is only set when the payload was served by a cache tier. A
/// `None` source with neither payload nor error is a clean miss.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchOutcome {
    pub source: CacheSource,
    pub payload: Option<Payload>,
    pub error: Option<TransportError>,
    pub cached_at: Option<DateTime<Utc>>,
}

impl FetchOutcome {
    /// Nothing found in any consulted source
    pub fn miss() -> Self {
        Self {
            source: CacheSource::None,
            payload: None,
            error: None,
            cached_at: None,
        }
    }

    pub fn cached(source: CacheSource, entry: CacheEntry) -> Self {
        Self {
            source,
            payload: Some(entry.payload),
            error: None,
            cached_at: Some(entry.stored_at),
        }
    }

    pub fn network(payload: Payload) -> Self {
        Self {
            source: CacheSource::Network,
            payload: Some(payload),
            error: None,
            cached_at: None,
        }
    }

    pub fn network_error(error: TransportError) -> Self {
        Self {
            source: CacheSource::Network,
            payload: None,
            error: Some(error),
            cached_at: None,
        }
    }

    /// Served from a cache tier
    pub fn is_hit(&self) -> bool {
        self.source.is_tier() && self.payload.is_some()
    }

    pub fn is_miss(&self) -> bool {
        self.source == CacheSource::None && self.payload.is_none() && self.error.is_none()
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}
