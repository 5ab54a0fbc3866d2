//! Cache key generation

use std::collections::BTreeMap;
use std::fmt::{self, Debug};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::domain::transport::Endpoint;

/// Opaque identifier addressing an entry in every cache tier
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Returns the string representation of the key
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the key as bytes for hashing
    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for CacheKey {
    fn from(key: String) -> Self {
        Self(key)
    }
}

impl From<&str> for CacheKey {
    fn from(key: &str) -> Self {
        Self(key.to_string())
    }
}

/// Request parameters, keyed by name
///
/// Names are kept sorted, so two mappings holding the same pairs compare and
/// serialize identically no matter the order they were inserted in.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestParams(BTreeMap<String, Value>);

impl RequestParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a parameter, replacing any previous value under the same name
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(name.into(), value.into())
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    /// Flattens the parameters into name/value string pairs
    ///
    /// Strings are kept verbatim, every other value is rendered as JSON.
    pub fn to_pairs(&self) -> Vec<(String, String)> {
        self.0
            .iter()
            .map(|(name, value)| {
                let rendered = match value {
                    Value::String(s) => s.clone(),
                    other => canonical_json(other),
                };
                (name.clone(), rendered)
            })
            .collect()
    }
}

impl<K, V> FromIterator<(K, V)> for RequestParams
where
    K: Into<String>,
    V: Into<Value>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

impl From<serde_json::Map<String, Value>> for RequestParams {
    fn from(map: serde_json::Map<String, Value>) -> Self {
        map.into_iter().collect()
    }
}

/// Trait for generating cache keys from request identity
///
/// Implementations must be deterministic and stable across process restarts:
/// the disk tier is addressed by these keys.
pub trait CacheKeyGenerator: Send + Sync + Debug {
    fn generate(&self, endpoint: &Endpoint, params: &RequestParams) -> CacheKey;
}

/// Default cache key generator using SHA-256 over a normalized request string
#[derive(Debug, Clone, Default)]
pub struct DefaultKeyGenerator {
    /// Whether to emit the normalized request string instead of its digest
    readable: bool,
}

impl DefaultKeyGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a generator that produces the normalized request string as key
    pub fn with_readable_keys(mut self) -> Self {
        self.readable = true;
        self
    }

    /// Renders the request identity as a JSON array
    ///
    /// Every part is a JSON string, so a query string in the URL or a `=`/`&`
    /// inside a parameter name cannot run into a neighbouring part.
    fn normalize(endpoint: &Endpoint, params: &RequestParams) -> String {
        let pairs: Vec<Value> = params
            .iter()
            .map(|(name, value)| {
                Value::Array(vec![
                    Value::String(name.clone()),
                    Value::String(canonical_json(value)),
                ])
            })
            .collect();

        Value::Array(vec![
            Value::String(endpoint.method.to_string()),
            Value::String(endpoint.url.clone()),
            Value::Array(pairs),
        ])
        .to_string()
    }
}

impl CacheKeyGenerator for DefaultKeyGenerator {
    fn generate(&self, endpoint: &Endpoint, params: &RequestParams) -> CacheKey {
        let combined = Self::normalize(endpoint, params);

        if self.readable {
            CacheKey(combined)
        } else {
            CacheKey(hex::encode(Sha256::digest(combined.as_bytes())))
        }
    }
}

/// Key generator backed by a closure
pub struct FnKeyGenerator<F>(F);

impl<F> FnKeyGenerator<F>
where
    F: Fn(&Endpoint, &RequestParams) -> CacheKey + Send + Sync,
{
    pub fn new(generate: F) -> Self {
        Self(generate)
    }

    pub fn shared(generate: F) -> Arc<dyn CacheKeyGenerator>
    where
        F: 'static,
    {
        Arc::new(Self(generate))
    }
}

impl<F> Debug for FnKeyGenerator<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnKeyGenerator").finish_non_exhaustive()
    }
}

impl<F> CacheKeyGenerator for FnKeyGenerator<F>
where
    F: Fn(&Endpoint, &RequestParams) -> CacheKey + Send + Sync,
{
    fn generate(&self, endpoint: &Endpoint, params: &RequestParams) -> CacheKey {
        (self.0)(endpoint, params)
    }
}

/// Renders a JSON value with object members sorted by name at every depth
fn canonical_json(value: &Value) -> String {
    match value {
        Value::Object(map) => {
            let mut members: Vec<(&String, &Value)> = map.iter().collect();
            members.sort_by(|a, b| a.0.cmp(b.0));

            let rendered: Vec<String> = members
                .into_iter()
                .map(|(k, v)| format!("{}:{}", Value::String(k.clone()), canonical_json(v)))
                .collect();

            format!("{{{}}}", rendered.join(","))
        }
        Value::Array(items) => {
            let rendered: Vec<String> = items.iter().map(canonical_json).collect();
            format!("[{}]", rendered.join(","))
        }
        other => other.to_string(),
    }
}
