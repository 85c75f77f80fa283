//! HTTP transport seam.
//!
//! `HttpTransport` performs one GET and reports what came back. Retry,
//! backoff and status classification live above it in `CbrClient`, so tests
//! can script responses without a network.

use super::provider::FetchError;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_BASE_URL: &str =
    "https://www.cbr-xml-daily.ru/archive/{y}/{m}/{d}/daily_json.js";
pub const DEFAULT_USER_AGENT: &str = "LabScraper/1.0 (+https://example.edu)";
const ACCEPT: &str = "application/json,text/plain,*/*";

/// Archive endpoint and HTTP client settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransportSettings {
    /// URL template with `{y}`, `{m}`, `{d}` placeholders.
    pub base_url: String,
    pub user_agent: String,
    pub timeout_secs: u64,
    pub pool_max_idle_per_host: usize,
}

impl Default for TransportSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout_secs: 20,
            pool_max_idle_per_host: 10,
        }
    }
}

/// What a single GET produced.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    pub status: u16,
    /// Raw `Retry-After` header, if any.
    pub retry_after: Option<String>,
    pub body: String,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            retry_after: None,
            body: body.into(),
        }
    }

    pub fn with_retry_after(mut self, value: impl Into<String>) -> Self {
        self.retry_after = Some(value.into());
        self
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Network-level failure: no usable HTTP response was received.
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    #[error("connection failed: {0}")]
    Connect(String),

    #[error("request timed out: {0}")]
    Timeout(String),

    #[error("request failed: {0}")]
    Other(String),
}

/// One-shot HTTP GET.
pub trait HttpTransport {
    fn get(&self, url: &str) -> Result<HttpResponse, TransportError>;
}

/// Blocking reqwest transport with a pooled, reused client.
pub struct ReqwestTransport {
    client: reqwest::blocking::Client,
}

impl ReqwestTransport {
    pub fn new(settings: &TransportSettings) -> Result<Self, FetchError> {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::ACCEPT,
            reqwest::header::HeaderValue::from_static(ACCEPT),
        );

        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .user_agent(settings.user_agent.clone())
            .default_headers(headers)
            .pool_max_idle_per_host(settings.pool_max_idle_per_host)
            .build()
            .map_err(|e| FetchError::Client(e.to_string()))?;

        Ok(Self { client })
    }
}

impl HttpTransport for ReqwestTransport {
    fn get(&self, url: &str) -> Result<HttpResponse, TransportError> {
        let resp = self.client.get(url).send().map_err(classify)?;
        let status = resp.status().as_u16();
        let retry_after = resp
            .headers()
            .get(reqwest::header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = resp.text().map_err(classify)?;
        Ok(HttpResponse {
            status,
            retry_after,
            body,
        })
    }
}

fn classify(e: reqwest::Error) -> TransportError {
    if e.is_timeout() {
        TransportError::Timeout(e.to_string())
    } else if e.is_connect() {
        TransportError::Connect(e.to_string())
    } else {
        TransportError::Other(e.to_string())
    }
}
