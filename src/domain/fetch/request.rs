//! Request identity handed to the fetch coordinator

use std::sync::Arc;

use serde_json::Value;

use super::strategy::{FetchMode, Strategy};
use crate::domain::cache::{CacheKey, CacheKeyGenerator, ExpireTime, RequestParams};
use crate::domain::transport::Endpoint;

/// One logical fetch: what to ask for, how fresh the cache must be, and the
/// strategy deciding where the answer comes from
#[derive(Debug, Clone)]
pub struct FetchRequest {
    pub endpoint: Endpoint,
    pub params: RequestParams,
    pub ttl: ExpireTime,
    pub strategy: Strategy,
    key: Option<CacheKey>,
    key_generator: Option<Arc<dyn CacheKeyGenerator>>,
}

impl FetchRequest {
    pub fn new(endpoint: Endpoint) -> Self {
        Self {
            endpoint,
            params: RequestParams::default(),
            ttl: ExpireTime::Never,
            strategy: Strategy::default(),
            key: None,
            key_generator: None,
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Endpoint::get(url))
    }

    pub fn post(url: impl Into<String>) -> Self {
        Self::new(Endpoint::post(url))
    }

    pub fn with_params(mut self, params: RequestParams) -> Self {
        self.params = params;
        self
    }

    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.insert(name, value);
        self
    }

    pub fn with_ttl(mut self, ttl: ExpireTime) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn with_strategy(mut self, strategy: impl Into<Strategy>) -> Self {
        self.strategy = strategy.into();
        self
    }

    pub fn with_mode(mut self, mode: FetchMode) -> Self {
        self.strategy.mode = mode;
        self
    }

    /// Addresses the cache with a pre-resolved key instead of generating one
    pub fn with_key(mut self, key: impl Into<CacheKey>) -> Self {
        self.key = Some(key.into());
        self
    }

    /// Overrides the cache's key generator for this request only
    pub fn with_key_generator(mut self, generator: Arc<dyn CacheKeyGenerator>) -> Self {
        self.key_generator = Some(generator);
        self
    }

    /// Resolves the cache key: explicit key, then the per-request generator,
    /// then `fallback`
    pub fn cache_key(&self, fallback: &dyn CacheKeyGenerator) -> CacheKey {
        if let Some(key) = &self.key {
            return key.clone();
        }

        match &self.key_generator {
            Some(generator) => generator.generate(&self.endpoint, &self.params),
            None => fallback.generate(&self.endpoint, &self.params),
        }
    }
}
