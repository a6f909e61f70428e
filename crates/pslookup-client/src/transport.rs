//! The transport a message channel posts documents over.

use async_trait::async_trait;
use pslookup_core::{LookupError, Result};
use reqwest::header::CONTENT_TYPE;
use reqwest::Client as HttpClient;
use std::time::Duration;
use tracing::debug;

/// A raw response from a [`Transport`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    /// HTTP status code
    pub status: u16,
    /// Response body
    pub body: String,
}

impl TransportResponse {
    /// Returns true for 2xx statuses
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }
}

/// Posts a request document to an endpoint.
///
/// Implementations report connection-level failures as
/// [`LookupError::Transport`]; status handling is left to the caller.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Post `body` to `endpoint`
    async fn post(&self, endpoint: &str, body: String) -> Result<TransportResponse>;
}

/// HTTP transport backed by `reqwest`
#[derive(Debug, Clone)]
pub struct HttpTransport {
    http: HttpClient,
}

impl HttpTransport {
    /// Build a transport with the given request timeout and user agent
    pub fn new(timeout: Duration, user_agent: &str) -> Result<Self> {
        let http = HttpClient::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .gzip(true)
            .build()
            .map_err(|e| LookupError::Config(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { http })
    }

    /// Wrap an existing `reqwest` client
    #[must_use]
    pub const fn from_client(http: HttpClient) -> Self {
        Self { http }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn post(&self, endpoint: &str, body: String) -> Result<TransportResponse> {
        debug!(endpoint = %endpoint, bytes = body.len(), "POST request");

        let response = self
            .http
            .post(endpoint)
            .header(CONTENT_TYPE, "text/xml")
            .body(body)
            .send()
            .await
            .map_err(|e| LookupError::Transport(e.to_string()))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| LookupError::Transport(e.to_string()))?;

        Ok(TransportResponse { status, body })
    }
}
