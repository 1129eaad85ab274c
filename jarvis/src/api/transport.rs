//! Blocking HTTP transport
//!
//! Every remote call goes through [`Transport`], so the clients above it can
//! be exercised against a scripted transport in tests.

use reqwest::blocking::{Client, RequestBuilder};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

use super::ApiError;

/// Request timeout for the blocking client
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Status and raw body of an HTTP response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn json(&self) -> Result<Value, serde_json::Error> {
        serde_json::from_str(&self.body)
    }

    /// Best-effort rendering of the body for error messages
    pub fn diagnostic(&self) -> String {
        if self.body.trim().is_empty() {
            return "<empty body>".to_string();
        }
        match self.json() {
            Ok(value) => value.to_string(),
            Err(_) => self.body.trim().to_string(),
        }
    }
}

/// Synchronous HTTP transport
pub trait Transport: Send + Sync {
    fn get(&self, url: &str) -> Result<HttpResponse, ApiError>;

    fn post(&self, url: &str, body: &Value) -> Result<HttpResponse, ApiError>;

    fn put(&self, url: &str, body: &Value) -> Result<HttpResponse, ApiError>;
}

/// [`Transport`] backed by `reqwest`'s blocking client
pub struct HttpTransport {
    http: Client,
}

impl HttpTransport {
    pub fn new() -> Result<Self, ApiError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .user_agent(concat!("jarvis-cli/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { http })
    }

    fn send(&self, request: RequestBuilder) -> Result<HttpResponse, ApiError> {
        let response = request.send()?;
        let status = response.status().as_u16();
        let body = response.text()?;
        debug!(status, len = body.len(), "send: response received");
        Ok(HttpResponse { status, body })
    }
}

impl Transport for HttpTransport {
    fn get(&self, url: &str) -> Result<HttpResponse, ApiError> {
        debug!(%url, "HttpTransport::get: called");
        self.send(self.http.get(url))
    }

    fn post(&self, url: &str, body: &Value) -> Result<HttpResponse, ApiError> {
        debug!(%url, "HttpTransport::post: called");
        self.send(self.http.post(url).json(body))
    }

    fn put(&self, url: &str, body: &Value) -> Result<HttpResponse, ApiError> {
        debug!(%url, "HttpTransport::put: called");
        self.send(self.http.put(url).json(body))
    }
}
