//! Cache entries, sources and expiration policy

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::key::CacheKey;
use crate::domain::DomainError;

/// Opaque response payload as produced by the transport
pub type Payload = serde_json::Value;

/// Where a fetch outcome came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheSource {
    /// Nothing was found in any consulted source
    None,
    Memory,
    Disk,
    Network,
}

impl CacheSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            CacheSource::None => "none",
            CacheSource::Memory => "memory",
            CacheSource::Disk => "disk",
            CacheSource::Network => "network",
        }
    }

    /// Whether this source is one of the cache tiers
    pub fn is_tier(&self) -> bool {
        matches!(self, CacheSource::Memory | CacheSource::Disk)
    }
}

impl fmt::Display for CacheSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Maximum age at which a cached entry is still served
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExpireTime {
    /// Entries never go stale
    #[default]
    Never,
    /// Every entry is already stale; forces a miss
    Always,
    /// Entries younger than this are fresh
    After(Duration),
}

impl ExpireTime {
    pub fn seconds(secs: u64) -> Self {
        Self::After(Duration::from_secs(secs))
    }

    /// Freshness of an entry written at `stored_at`, judged at `now`
    ///
    /// A zero duration behaves exactly like [`ExpireTime::Always`].
    pub fn is_fresh(&self, stored_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        match self {
            ExpireTime::Never => true,
            ExpireTime::Always => false,
            ExpireTime::After(ttl) if ttl.is_zero() => false,
            ExpireTime::After(ttl) => match now.signed_duration_since(stored_at).to_std() {
                Ok(age) => age < *ttl,
                // Written "in the future" (clock moved backwards): younger than any ttl
                Err(_) => true,
            },
        }
    }
}

impl fmt::Display for ExpireTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExpireTime::Never => write!(f, "never"),
            ExpireTime::Always => write!(f, "always"),
            ExpireTime::After(ttl) => write!(f, "{}s", ttl.as_secs_f64()),
        }
    }
}

impl FromStr for ExpireTime {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();

        match trimmed.to_lowercase().as_str() {
            "never" => Ok(ExpireTime::Never),
            "always" => Ok(ExpireTime::Always),
            other => other
                .strip_suffix('s')
                .unwrap_or(other)
                .parse::<u64>()
                .map(ExpireTime::seconds)
                .map_err(|_| {
                    DomainError::configuration(format!(
                        "Invalid expire time: {}. Use 'never', 'always' or a number of seconds",
                        trimmed
                    ))
                }),
        }
    }
}

/// A payload stored in one cache tier
///
/// Entries are replaced wholesale on every write, never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub key: CacheKey,
    pub payload: Payload,
    pub stored_at: DateTime<Utc>,
}

impl CacheEntry {
    pub fn new(key: CacheKey, payload: Payload, stored_at: DateTime<Utc>) -> Self {
        Self {
            key,
            payload,
            stored_at,
        }
    }

    pub fn is_fresh(&self, ttl: ExpireTime, now: DateTime<Utc>) -> bool {
        ttl.is_fresh(self.stored_at, now)
    }
}
