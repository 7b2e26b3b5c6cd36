//! Dynamic query executor.
//!
//! # Design
//! Requests are described as plain data (`ApiRequest`) by the endpoint
//! builders; the `Executor` turns them into HTTP GETs with `reqwest`. The
//! connection parameters are read from the `ConfigStore` at *execution*
//! time, never captured at construction: the same executor serves a client
//! that is reconfigured mid-flight, and two client instances with different
//! credentials never observe each other's. No timeout, no retry, no
//! redirect handling beyond reqwest's defaults.

use serde::de::DeserializeOwned;

use crate::config::{ConfigStore, DEFAULT_API_URL};
use crate::error::ApiError;
use crate::types::Envelope;

/// Header carrying the API key when one is configured.
pub const API_KEY_HEADER: &str = "X-API-Key";

/// An outgoing request described as plain data.
///
/// Built by the `endpoints` module. `params` are decoded key/value pairs;
/// URL-encoding happens in the executor via reqwest's query serializer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiRequest {
    pub name: &'static str,
    pub path: &'static str,
    pub params: Vec<(&'static str, String)>,
}

/// Executes `ApiRequest`s against the currently configured host.
#[derive(Debug, Clone)]
pub struct Executor {
    http: reqwest::Client,
    config: ConfigStore,
}

impl Executor {
    pub fn new(config: ConfigStore) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }

    /// The base URL requests would hit right now: the configured `api_url`
    /// if non-empty, else the fallback host. Trailing slashes are stripped
    /// so path joining stays predictable. The cache layer uses this value
    /// to scope its keys.
    pub fn effective_base_url(&self) -> String {
        let config = self.config.get();
        let base = if config.api_url.is_empty() {
            DEFAULT_API_URL
        } else {
            &config.api_url
        };
        base.trim_end_matches('/').to_string()
    }

    /// Perform the HTTP GET against the currently configured host and parse
    /// the enveloped response.
    ///
    /// Configuration is re-read on every call. The envelope is returned
    /// unmodified; unwrapping `data` is the endpoint layer's job.
    pub async fn execute<T: DeserializeOwned>(
        &self,
        request: &ApiRequest,
    ) -> Result<Envelope<T>, ApiError> {
        self.execute_at(&self.effective_base_url(), request).await
    }

    /// Perform the HTTP GET against a base URL the caller already resolved.
    ///
    /// The query layer resolves the base once per invocation and uses the
    /// same value as the cache scope, so a request always settles under the
    /// scope it was issued for even if the host is reconfigured while the
    /// fetch is still queued. The api key is still read here, at execution
    /// time.
    pub async fn execute_at<T: DeserializeOwned>(
        &self,
        base: &str,
        request: &ApiRequest,
    ) -> Result<Envelope<T>, ApiError> {
        let config = self.config.get();
        let url = format!("{}{}", base.trim_end_matches('/'), request.path);

        let mut builder = self.http.get(&url).query(&request.params);
        if !config.api_key.is_empty() {
            builder = builder.header(API_KEY_HEADER, &config.api_key);
        }

        tracing::debug!(endpoint = request.name, %url, "dispatching request");
        let response = builder
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;

        if !status.is_success() {
            tracing::debug!(
                endpoint = request.name,
                status = status.as_u16(),
                "request failed"
            );
            return Err(ApiError::Http {
                status: status.as_u16(),
                body,
            });
        }

        tracing::debug!(endpoint = request.name, status = status.as_u16(), "request settled");
        serde_json::from_str(&body).map_err(|e| ApiError::Parse(e.to_string()))
    }
}
