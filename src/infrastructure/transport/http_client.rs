use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::domain::cache::{Payload, RequestParams};
use crate::domain::transport::{Endpoint, HttpMethod, Transport, TransportError};
use crate::domain::DomainError;

/// Transport using reqwest
///
/// GET requests carry the parameters as query string, POST requests as a JSON
/// body. Response bodies are decoded as JSON, falling back to a JSON string
/// for UTF-8 bodies that are not JSON.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: Option<String>,
}

impl HttpTransport {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: None,
        }
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self, DomainError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DomainError::configuration(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: None,
        })
    }

    /// Resolves relative endpoint URLs against `base_url`
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    fn resolve_url(&self, url: &str) -> String {
        match &self.base_url {
            Some(base) if !url.starts_with("http://") && !url.starts_with("https://") => {
                format!(
                    "{}/{}",
                    base.trim_end_matches('/'),
                    url.trim_start_matches('/')
                )
            }
            _ => url.to_string(),
        }
    }

    fn decode_body(bytes: &[u8]) -> Result<Payload, TransportError> {
        if bytes.is_empty() {
            return Ok(Value::Null);
        }

        match serde_json::from_slice(bytes) {
            Ok(value) => Ok(value),
            Err(json_error) => match std::str::from_utf8(bytes) {
                Ok(text) => Ok(Value::String(text.to_string())),
                Err(_) => Err(TransportError::decode(json_error.to_string())),
            },
        }
    }
}

impl Default for HttpTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(
        &self,
        endpoint: &Endpoint,
        params: &RequestParams,
    ) -> Result<Payload, TransportError> {
        let url = self.resolve_url(&endpoint.url);

        let request = match endpoint.method {
            HttpMethod::Get => self.client.get(&url).query(&params.to_pairs()),
            HttpMethod::Post => self.client.post(&url).json(params),
        };

        let response = request
            .send()
            .await
            .map_err(|e| TransportError::request(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let error_body = response.text().await.unwrap_or_default();
            return Err(TransportError::status(status, error_body));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| TransportError::request(format!("Failed to read response: {}", e)))?;

        Self::decode_body(&body)
    }
}
