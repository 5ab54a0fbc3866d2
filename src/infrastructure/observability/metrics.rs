//! Cache and fetch metrics
//!
//! Uses the `metrics` facade only; installing an exporter is left to the
//! embedding application.

use metrics::counter;

use crate::domain::cache::CacheSource;
use crate::domain::fetch::FetchMode;

/// Record a single tier lookup
pub fn record_cache_lookup(tier: CacheSource, hit: bool) {
    let result = if hit { "hit" } else { "miss" };
    let labels = [("tier", tier.as_str().to_string()), ("result", result.to_string())];

    counter!("fetch_cache_lookups_total", &labels).increment(1);
}

/// Record a failed tier write or delete
pub fn record_cache_write_failure(tier: CacheSource, operation: &'static str) {
    let labels = [
        ("tier", tier.as_str().to_string()),
        ("operation", operation.to_string()),
    ];

    counter!("fetch_cache_write_failures_total", &labels).increment(1);
}

/// Record one delivered fetch outcome
pub fn record_fetch_delivery(mode: FetchMode, source: CacheSource, is_error: bool) {
    let labels = [
        ("mode", mode.as_str().to_string()),
        ("source", source.as_str().to_string()),
        ("error", is_error.to_string()),
    ];

    counter!("fetch_requests_total", &labels).increment(1);
}
