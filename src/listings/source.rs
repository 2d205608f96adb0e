//! Outbound page fetching.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tracing::debug;

/// Errors that can occur while fetching a page.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Unexpected HTTP status: {0}")]
    Status(u16),

    #[error("Request failed: {0}")]
    Transport(String),

    #[error("Failed to build HTTP client: {0}")]
    Client(String),
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        Self::Transport(err.to_string())
    }
}

/// A single GET request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    pub url: String,
    pub headers: Vec<(String, String)>,
}

impl PageRequest {
    #[must_use]
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            headers: Vec::new(),
        }
    }

    /// Adds a request header.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}

/// Raw response to a [`PageRequest`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageResponse {
    pub status: u16,
    pub body: String,
}

impl PageResponse {
    #[must_use]
    pub const fn is_ok(&self) -> bool {
        self.status == 200
    }
}

/// Capability to perform one GET against a remote page.
///
/// Transport failures are returned as [`FetchError::Transport`]; any
/// response that arrives, whatever its status, is returned as `Ok`.
#[async_trait]
pub trait PageSource: Send + Sync {
    async fn get(&self, request: &PageRequest) -> Result<PageResponse, FetchError>;
}

/// [`PageSource`] backed by `reqwest` with an explicit timeout.
#[derive(Debug, Clone)]
pub struct HttpPageSource {
    client: reqwest::Client,
}

impl HttpPageSource {
    /// Builds a client whose requests give up after `timeout`.
    pub fn new(timeout: Duration) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| FetchError::Client(e.to_string()))?;

        Ok(Self { client })
    }
}

#[async_trait]
impl PageSource for HttpPageSource {
    async fn get(&self, request: &PageRequest) -> Result<PageResponse, FetchError> {
        debug!("GET {}", request.url);

        let mut builder = self.client.get(&request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;

        debug!("GET {} -> {} ({} bytes)", request.url, status, body.len());
        Ok(PageResponse { status, body })
    }
}
