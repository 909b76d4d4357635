//! Request and response values exchanged with the worker.

use bytes::Bytes;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use shellcache_core::StoredResponse;
use shellcache_core::cache::hash::compute_request_key;
use url::Url;

pub use reqwest::{Method, StatusCode, header};

/// Body of the synthetic response returned when neither network nor cache
/// can answer.
pub const OFFLINE_BODY: &str = "Offline";

/// An intercepted outgoing request.
#[derive(Debug, Clone)]
pub struct Request {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
}

impl Request {
    pub fn new(method: Method, url: Url) -> Self {
        Self { method, url, headers: HeaderMap::new() }
    }

    pub fn get(url: Url) -> Self {
        Self::new(Method::GET, url)
    }

    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Whether the Accept header asks for an HTML document.
    pub fn accepts_html(&self) -> bool {
        self.headers
            .get(header::ACCEPT)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|accept| accept.contains("text/html"))
    }

    /// Cache key for this request; the URL fragment is not part of it.
    pub fn cache_key(&self) -> String {
        let mut url = self.url.clone();
        url.set_fragment(None);
        compute_request_key(self.method.as_str(), url.as_str())
    }
}

/// A response handed back to the page, from the network or a partition.
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    pub url: Option<Url>,
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl Response {
    pub fn new(status: StatusCode, body: impl Into<Bytes>) -> Self {
        Self { url: None, status, headers: HeaderMap::new(), body: body.into() }
    }

    /// 503 with an `Offline` body and no content type.
    pub fn offline() -> Self {
        Self::new(StatusCode::SERVICE_UNAVAILABLE, OFFLINE_BODY)
    }

    /// 503 with an `Offline` body labelled `text/plain`.
    pub fn offline_text() -> Self {
        let mut response = Self::offline();
        response
            .headers
            .insert(header::CONTENT_TYPE, HeaderValue::from_static("text/plain"));
        response
    }

    /// True for 2xx statuses; only these are ever stored.
    pub fn ok(&self) -> bool {
        self.status.is_success()
    }

    pub fn content_type(&self) -> Option<&str> {
        self.headers
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
    }

    /// Snapshot this response for storage under the request's key.
    pub fn to_stored(&self, request: &Request) -> StoredResponse {
        let mut url = request.url.clone();
        url.set_fragment(None);
        StoredResponse {
            key: request.cache_key(),
            method: request.method.to_string(),
            url: url.to_string(),
            status: self.status.as_u16(),
            headers: self
                .headers
                .iter()
                .filter_map(|(name, value)| match value.to_str() {
                    Ok(value) => Some((name.to_string(), value.to_string())),
                    Err(_) => {
                        tracing::debug!(url = %url, header = %name, "dropping non-text header from stored response");
                        None
                    }
                })
                .collect(),
            body: self.body.to_vec(),
            stored_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// Rebuild a response from storage. Headers that no longer parse are
    /// dropped.
    pub fn from_stored(stored: StoredResponse) -> Self {
        let mut headers = HeaderMap::new();
        for (name, value) in &stored.headers {
            if let (Ok(name), Ok(value)) = (HeaderName::try_from(name.as_str()), HeaderValue::from_str(value)) {
                headers.append(name, value);
            }
        }

        Self {
            url: Url::parse(&stored.url).ok(),
            status: StatusCode::from_u16(stored.status).unwrap_or(StatusCode::OK),
            headers,
            body: Bytes::from(stored.body),
        }
    }
}
