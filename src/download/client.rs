//! HTTP client wrapper for catalog and print-view pages.
//!
//! One [`HttpClient`] is built per run and cloned into every task; clones
//! share the underlying connection pool.

use std::time::Duration;

use reqwest::header::REFERER;
use reqwest::{Client, ClientBuilder};
use tracing::{debug, instrument};

use super::constants::{CONNECT_TIMEOUT_SECS, FETCH_TIMEOUT_SECS, READ_TIMEOUT_SECS};
use super::error::FetchError;
use crate::user_agent;

/// HTTP client for fetching catalog pages.
///
/// Every call to [`fetch_page`](Self::fetch_page) is bounded by a per-fetch
/// deadline covering both the request and the body read; expiry surfaces as
/// [`FetchError::Unreachable`].
///
/// # Example
///
/// ```no_run
/// use chartfetch_core::download::HttpClient;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = HttpClient::new();
/// let html = client.fetch_page("https://aip.example/chapter/index.html", None).await?;
/// println!("{} bytes", html.len());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
    fetch_timeout: Duration,
}

impl Default for HttpClient {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpClient {
    /// Creates a new HTTP client with default timeouts.
    ///
    /// Default configuration:
    /// - Connect timeout: 15 seconds
    /// - Read timeout: 60 seconds
    /// - Per-fetch deadline: 60 seconds
    /// - Gzip decompression: enabled
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client builder fails to build with the static
    /// configuration. This should never happen in practice.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn new() -> Self {
        Self::with_timeouts(
            Duration::from_secs(CONNECT_TIMEOUT_SECS),
            Duration::from_secs(READ_TIMEOUT_SECS),
            Duration::from_secs(FETCH_TIMEOUT_SECS),
        )
        .expect("failed to build HTTP client with static configuration")
    }

    /// Creates a new HTTP client with explicit timeout values.
    ///
    /// # Errors
    ///
    /// Returns the reqwest builder error if the TLS backend cannot be initialized.
    #[instrument(level = "debug")]
    pub fn with_timeouts(
        connect_timeout: Duration,
        read_timeout: Duration,
        fetch_timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let client = base_client_builder(connect_timeout, read_timeout).build()?;
        Ok(Self {
            client,
            fetch_timeout,
        })
    }

    /// Returns the per-fetch deadline.
    #[must_use]
    pub fn fetch_timeout(&self) -> Duration {
        self.fetch_timeout
    }

    /// Fetches a page and returns its body as text.
    ///
    /// `referer` is sent as the `Referer` header when given; the print view
    /// expects the enclosing leaf page there.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Unreachable`] for transport errors, non-success
    /// statuses, undecodable bodies and an expired per-fetch deadline.
    #[instrument(level = "debug", skip(self), fields(url = %url))]
    pub async fn fetch_page(&self, url: &str, referer: Option<&str>) -> Result<String, FetchError> {
        match tokio::time::timeout(self.fetch_timeout, self.fetch_page_inner(url, referer)).await {
            Ok(result) => result,
            Err(_) => Err(FetchError::timed_out(url, self.fetch_timeout)),
        }
    }

    async fn fetch_page_inner(&self, url: &str, referer: Option<&str>) -> Result<String, FetchError> {
        let mut request = self.client.get(url);
        if let Some(referer) = referer {
            request = request.header(REFERER, referer);
        }

        let response = request
            .send()
            .await
            .map_err(|e| FetchError::transport(url, &e))?;

        let status = response.status();
        if !status.is_success() {
            debug!(status = status.as_u16(), "non-success status");
            return Err(FetchError::http_status(url, status.as_u16()));
        }

        let body = response
            .text()
            .await
            .map_err(|e| FetchError::transport(url, &e))?;
        debug!(bytes = body.len(), "page fetched");
        Ok(body)
    }
}

fn base_client_builder(connect_timeout: Duration, read_timeout: Duration) -> ClientBuilder {
    Client::builder()
        .connect_timeout(connect_timeout)
        .timeout(read_timeout)
        .gzip(true)
        .user_agent(user_agent::default_user_agent())
}
