//! Network seam for the worker.
//!
//! ### Fetcher
//! - `Fetcher` is the only way the worker reaches the network, so tests and
//!   hosts can substitute their own transport.
//! - A rejected fetch (`FetchError`) means "no response at all" (offline,
//!   DNS failure, connection reset). HTTP error statuses are still
//!   responses and come back as `Ok`.
//!
//! ### HttpFetcher
//! - reqwest client with rustls, compression, and a bounded redirect chain.
//! - Request timeout from configuration (default: 20s)

pub mod url;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Client;
use shellcache_core::{AppConfig, Error};
use std::time::{Duration, Instant};

use crate::http::{Request, Response};

pub use self::url::{UrlError, resolve};

/// A fetch that produced no response.
#[derive(Debug, Clone, thiserror::Error)]
pub enum FetchError {
    #[error("network error: {0}")]
    Network(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl From<FetchError> for Error {
    fn from(err: FetchError) -> Self {
        match err {
            FetchError::Network(msg) => Error::Network(msg),
            FetchError::InvalidRequest(msg) => Error::InvalidUrl(msg),
        }
    }
}

/// Something that can turn a request into a response.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, request: &Request) -> Result<Response, FetchError>;
}

/// Configuration for the HTTP fetcher.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// User agent string (default: "shellcache/0.1")
    pub user_agent: String,

    /// Request timeout (default: 20s)
    pub timeout: Duration,

    /// Maximum number of redirects to follow (default: 5)
    pub max_redirects: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self { user_agent: "shellcache/0.1".to_string(), timeout: Duration::from_millis(20000), max_redirects: 5 }
    }
}

impl From<&AppConfig> for FetchConfig {
    fn from(config: &AppConfig) -> Self {
        Self { user_agent: config.user_agent.clone(), timeout: config.timeout(), ..Default::default() }
    }
}

/// reqwest-backed fetcher.
pub struct HttpFetcher {
    http: Client,
    config: FetchConfig,
}

impl HttpFetcher {
    /// Create a new fetcher with the given configuration.
    pub fn new(config: FetchConfig) -> Result<Self, Error> {
        let http = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.timeout)
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .use_rustls_tls()
            .gzip(true)
            .brotli(true)
            .deflate(true)
            .build()
            .map_err(|e| Error::Network(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { http, config })
    }

    fn network_error(&self, err: &reqwest::Error) -> FetchError {
        if err.is_timeout() {
            FetchError::Network(format!("timed out after {}ms", self.config.timeout.as_millis()))
        } else {
            FetchError::Network(err.to_string())
        }
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, request: &Request) -> Result<Response, FetchError> {
        let start = Instant::now();

        match request.url.scheme() {
            "http" | "https" => {}
            scheme => return Err(FetchError::InvalidRequest(format!("unsupported scheme: {scheme}"))),
        }

        let response = self
            .http
            .request(request.method.clone(), request.url.clone())
            .headers(request.headers.clone())
            .send()
            .await
            .map_err(|e| self.network_error(&e))?;

        let status = response.status();
        let final_url = response.url().clone();
        let headers = response.headers().clone();

        let body: Bytes = response
            .bytes()
            .await
            .map_err(|e| FetchError::Network(format!("failed to read response: {}", e)))?;

        tracing::debug!(
            url = %request.url,
            final_url = %final_url,
            status = status.as_u16(),
            bytes = body.len(),
            fetch_ms = start.elapsed().as_millis() as u64,
            "fetched"
        );

        Ok(Response { url: Some(final_url), status, headers, body })
    }
}
