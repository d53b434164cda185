//! HTTP JSON fetching for the RISE API.
//!
//! ### Request shape
//! - `Accept: application/vnd.api+json` on every request.
//! - Absolute http(s) URLs only; the URL string is never rewritten.
//!
//! ### Failure mapping
//! - Network failure or timeout: `Error::Connection`
//! - Non-2xx status or a body that is not JSON: `Error::Query`, with the
//!   response body in the message for diagnostics.
//!
//! No retries are attempted; the first failure is returned.

pub mod url;

use async_trait::async_trait;
use reqwest::{Client, header};
use serde_json::Value;
use std::time::{Duration, Instant};

pub use self::url::{UrlError, resolve_relationship, validate, with_query};

use rise_core::{AppConfig, Error};

/// Media type the RISE API expects in the Accept header.
pub const JSON_API: &str = "application/vnd.api+json";

/// Something that can GET a URL and decode its JSON body.
///
/// [`crate::RiseCache`] only talks to the network through this trait, which
/// lets tests swap in canned responses.
#[async_trait]
pub trait JsonSource: Send + Sync {
    async fn get_json(&self, url: &str) -> Result<Value, Error>;
}

/// Configuration for the fetch client.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// User agent string (default: "rise-edr/0.1")
    pub user_agent: String,

    /// Request timeout (default: 20s)
    pub timeout: Duration,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self { user_agent: "rise-edr/0.1".to_string(), timeout: Duration::from_millis(20_000) }
    }
}

impl From<&AppConfig> for FetchConfig {
    fn from(config: &AppConfig) -> Self {
        Self { user_agent: config.user_agent.clone(), timeout: config.timeout() }
    }
}

/// reqwest-backed [`JsonSource`].
#[derive(Debug, Clone)]
pub struct FetchClient {
    http: Client,
    config: FetchConfig,
}

impl FetchClient {
    /// Create a new fetch client with the given configuration.
    pub fn new(config: FetchConfig) -> Result<Self, Error> {
        let http = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.timeout)
            .use_rustls_tls()
            .gzip(true)
            .brotli(true)
            .deflate(true)
            .build()
            .map_err(|e| Error::Connection(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { http, config })
    }

    /// Get reference to the configuration.
    pub fn config(&self) -> &FetchConfig {
        &self.config
    }
}

#[async_trait]
impl JsonSource for FetchClient {
    async fn get_json(&self, url_str: &str) -> Result<Value, Error> {
        let start = Instant::now();
        let url = validate(url_str).map_err(|e| Error::InvalidUrl(format!("{url_str}: {e}")))?;

        let response = self
            .http
            .get(url)
            .header(header::ACCEPT, JSON_API)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    Error::Connection(format!("timed out fetching {url_str}"))
                } else {
                    Error::Connection(format!("network error fetching {url_str}: {e}"))
                }
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| Error::Connection(format!("failed to read response from {url_str}: {e}")))?;

        if !status.is_success() {
            return Err(Error::Query(format!("{url_str} returned status {}: {body}", status.as_u16())));
        }

        let payload: Value = serde_json::from_str(&body).map_err(|e| {
            tracing::error!(url = url_str, error = %e, body = %body, "response body is not JSON");
            Error::Query(format!("undecodable response from {url_str}: {e}: {body}"))
        })?;

        tracing::debug!(url = url_str, status = status.as_u16(), fetch_ms = start.elapsed().as_millis() as u64, "fetched");

        Ok(payload)
    }
}
