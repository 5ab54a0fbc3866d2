//! Convenience surface over the fetch coordinator

use std::sync::Arc;

use tokio::task::JoinHandle;

use super::fetch_coordinator::FetchCoordinator;
use super::fetch_handle::FetchHandle;
use crate::domain::cache::{ExpireTime, RequestParams};
use crate::domain::fetch::{FetchMode, FetchOutcome, FetchRequest, Strategy};
use crate::domain::transport::{Endpoint, Transport};
use crate::infrastructure::cache::ResponseCache;

/// Named fetch operations, one per primary mode
///
/// Each operation works for GET and POST endpoints alike. When no TTL is
/// given the client default applies, which is `Never` unless configured.
#[derive(Debug, Clone)]
pub struct FetchClient {
    coordinator: FetchCoordinator,
    default_ttl: ExpireTime,
}

impl FetchClient {
    pub fn new(cache: Arc<ResponseCache>, transport: Arc<dyn Transport>) -> Self {
        Self::from_coordinator(FetchCoordinator::new(cache, transport))
    }

    pub fn from_coordinator(coordinator: FetchCoordinator) -> Self {
        Self {
            coordinator,
            default_ttl: ExpireTime::Never,
        }
    }

    pub fn with_default_ttl(mut self, ttl: ExpireTime) -> Self {
        self.default_ttl = ttl;
        self
    }

    pub fn cache(&self) -> &Arc<ResponseCache> {
        self.coordinator.cache()
    }

    /// Always asks the network
    pub fn network_only(
        &self,
        endpoint: Endpoint,
        params: RequestParams,
        ttl: Option<ExpireTime>,
    ) -> FetchHandle {
        self.run(endpoint, params, ttl, FetchMode::NetworkOnly)
    }

    /// Asks the network, falling back to a fresh cache entry on failure
    pub fn network_with_fallback(
        &self,
        endpoint: Endpoint,
        params: RequestParams,
        ttl: Option<ExpireTime>,
    ) -> FetchHandle {
        self.run(endpoint, params, ttl, FetchMode::NetworkFirst)
    }

    /// Serves a fresh cache entry, asking the network only on a miss
    pub fn cache_first(
        &self,
        endpoint: Endpoint,
        params: RequestParams,
        ttl: Option<ExpireTime>,
    ) -> FetchHandle {
        self.run(endpoint, params, ttl, FetchMode::LocalFirst)
    }

    /// Serves a fresh cache entry if present, then the network response
    pub fn cache_then_network(
        &self,
        endpoint: Endpoint,
        params: RequestParams,
        ttl: Option<ExpireTime>,
    ) -> FetchHandle {
        self.run(endpoint, params, ttl, FetchMode::LocalAndNetwork)
    }

    /// Never touches the network
    pub fn cache_only(
        &self,
        endpoint: Endpoint,
        params: RequestParams,
        ttl: Option<ExpireTime>,
    ) -> FetchHandle {
        self.run(endpoint, params, ttl, FetchMode::LocalOnly)
    }

    /// Builds a request carrying this client's TTL default
    pub fn request(
        &self,
        endpoint: Endpoint,
        params: RequestParams,
        ttl: Option<ExpireTime>,
        strategy: impl Into<Strategy>,
    ) -> FetchRequest {
        FetchRequest::new(endpoint)
            .with_params(params)
            .with_ttl(ttl.unwrap_or(self.default_ttl))
            .with_strategy(strategy)
    }

    pub fn fetch(&self, request: FetchRequest) -> FetchHandle {
        self.coordinator.fetch(request)
    }

    /// Runs `request` and invokes `callback` once per delivered outcome
    pub fn fetch_with_callback<F>(&self, request: FetchRequest, callback: F) -> JoinHandle<()>
    where
        F: FnMut(FetchOutcome) + Send + 'static,
    {
        self.fetch(request).on_outcome(callback)
    }

    fn run(
        &self,
        endpoint: Endpoint,
        params: RequestParams,
        ttl: Option<ExpireTime>,
        mode: FetchMode,
    ) -> FetchHandle {
        self.fetch(self.request(endpoint, params, ttl, mode))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use crate::domain::cache::{CacheSource, ManualClock};
    use crate::domain::transport::TransportError;
    use crate::infrastructure::cache::MemoryTierConfig;
    use crate::infrastructure::transport::MockTransport;
    use serde_json::json;
    use tempfile::TempDir;

    fn create_client(
        transport: MockTransport,
    ) -> (FetchClient, Arc<MockTransport>, Arc<ManualClock>, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let clock = Arc::new(ManualClock::new());
        let cache = ResponseCache::open_with(
            "client",
            temp_dir.path(),
            MemoryTierConfig::default(),
            clock.clone(),
        )
        .unwrap();
        let transport = Arc::new(transport);
        let client = FetchClient::new(Arc::new(cache), transport.clone());
        (client, transport, clock, temp_dir)
    }

    fn params() -> RequestParams {
        RequestParams::new().with("q", "rust")
    }

    #[tokio::test]
    async fn test_cache_first_after_network_only() {
        let (client, transport, _clock, _temp_dir) =
            create_client(MockTransport::new().with_response(json!({"n": 1})));
        let endpoint = Endpoint::get("https://api.test/search");

        let first = client
            .network_only(endpoint.clone(), params(), None)
            .last()
            .await
            .unwrap();
        let second = client
            .cache_first(endpoint, params(), None)
            .last()
            .await
            .unwrap();

        assert_eq!(first.source, CacheSource::Network);
        assert_eq!(second.source, CacheSource::Memory);
        assert_eq!(second.payload, Some(json!({"n": 1})));
        assert_eq!(transport.calls(), 1);
    }

    #[tokio::test]
    async fn test_get_and_post_do_not_share_entries() {
        let (client, _transport, _clock, _temp_dir) =
            create_client(MockTransport::new().with_response(json!("posted")));

        client
            .network_only(Endpoint::post("https://api.test/search"), params(), None)
            .collect()
            .await;

        let outcome = client
            .cache_only(Endpoint::get("https://api.test/search"), params(), None)
            .last()
            .await
            .unwrap();
        assert!(outcome.is_miss());

        let outcome = client
            .cache_only(Endpoint::post("https://api.test/search"), params(), None)
            .last()
            .await
            .unwrap();
        assert_eq!(outcome.payload, Some(json!("posted")));
    }

    #[tokio::test]
    async fn test_default_ttl_applies_when_unset() {
        let (client, _transport, clock, _temp_dir) =
            create_client(MockTransport::new().with_response(json!("v")));
        let client = client.with_default_ttl(ExpireTime::seconds(10));
        let endpoint = Endpoint::get("https://api.test/items");

        client
            .network_with_fallback(endpoint.clone(), RequestParams::new(), None)
            .collect()
            .await;
        clock.advance_secs(11);

        let stale = client
            .cache_only(endpoint.clone(), RequestParams::new(), None)
            .last()
            .await
            .unwrap();
        let never = client
            .cache_only(endpoint, RequestParams::new(), Some(ExpireTime::Never))
            .last()
            .await
            .unwrap();

        assert!(stale.is_miss());
        assert!(never.is_hit());
    }

    #[tokio::test]
    async fn test_cache_then_network_with_callback() {
        let (client, _transport, _clock, _temp_dir) = create_client(
            MockTransport::new()
                .with_response(json!("one"))
                .with_response(json!("two")),
        );
        let endpoint = Endpoint::get("https://api.test/feed");

        client
            .network_only(endpoint.clone(), RequestParams::new(), None)
            .collect()
            .await;

        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let request = client.request(
            endpoint,
            RequestParams::new(),
            None,
            FetchMode::LocalAndNetwork,
        );

        client
            .fetch_with_callback(request, move |outcome| {
                sink.lock().unwrap().push((outcome.source, outcome.payload));
            })
            .await
            .unwrap();

        let seen = seen.lock().unwrap();
        assert_eq!(
            *seen,
            vec![
                (CacheSource::Memory, Some(json!("one"))),
                (CacheSource::Network, Some(json!("two"))),
            ]
        );
    }

    #[tokio::test]
    async fn test_network_with_fallback_serves_cache_on_failure() {
        let (client, _transport, _clock, _temp_dir) = create_client(
            MockTransport::new()
                .with_response(json!("cached"))
                .with_error(TransportError::status(502, "bad gateway")),
        );
        let endpoint = Endpoint::get("https://api.test/items");

        client
            .network_only(endpoint.clone(), RequestParams::new(), None)
            .collect()
            .await;
        let outcome = client
            .network_with_fallback(endpoint, RequestParams::new(), None)
            .last()
            .await
            .unwrap();

        assert_eq!(outcome.source, CacheSource::Memory);
        assert_eq!(outcome.payload, Some(json!("cached")));
    }
}
