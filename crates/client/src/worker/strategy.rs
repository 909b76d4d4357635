//! Cache-first and network-first response strategies.

use serde::{Deserialize, Serialize};
use shellcache_core::Error;

use super::ServiceWorker;
use crate::fetch::resolve;
use crate::http::{Request, Response};

/// Where a served response came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ResponseSource {
    Network,
    Cache,
    /// The cached root document, standing in for an uncached navigation.
    OfflineShell,
    /// Synthetic 503.
    Offline,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Served {
    pub response: Response,
    pub source: ResponseSource,
}

impl Served {
    fn new(response: Response, source: ResponseSource) -> Self {
        Self { response, source }
    }
}

impl ServiceWorker {
    /// Serve from any partition; fall back to the network and keep a copy
    /// in the static partition.
    ///
    /// A hit never touches the network. Shell assets are invalidated by
    /// bumping the cache version, not by revalidation.
    pub async fn cache_first(&self, request: &Request) -> Result<Served, Error> {
        if let Some(stored) = self.cache.match_response(&request.cache_key()).await? {
            return Ok(Served::new(Response::from_stored(stored), ResponseSource::Cache));
        }

        match self.fetcher.fetch(request).await {
            Ok(response) => {
                if response.ok() {
                    self.store_in_background(self.version.static_name(), request, &response);
                }
                Ok(Served::new(response, ResponseSource::Network))
            }
            Err(e) => {
                tracing::warn!(url = %request.url, error = %e, "cache first failed");
                Ok(Served::new(Response::offline(), ResponseSource::Offline))
            }
        }
    }

    /// Prefer the network and keep a copy in the dynamic partition; when the
    /// network is unreachable fall back to the cache, then to the cached
    /// root document for HTML navigations, then to a plain-text 503.
    pub async fn network_first(&self, request: &Request) -> Result<Served, Error> {
        let error = match self.fetcher.fetch(request).await {
            Ok(response) => {
                if response.ok() {
                    self.store_in_background(self.version.dynamic_name(), request, &response);
                }
                return Ok(Served::new(response, ResponseSource::Network));
            }
            Err(e) => e,
        };

        if let Some(stored) = self.cache.match_response(&request.cache_key()).await? {
            tracing::info!(url = %request.url, "serving from cache");
            return Ok(Served::new(Response::from_stored(stored), ResponseSource::Cache));
        }

        if request.accepts_html() {
            let shell = Request::get(resolve(&self.origin, "/")?);
            if let Some(stored) = self.cache.match_response(&shell.cache_key()).await? {
                tracing::info!(url = %request.url, "serving offline shell");
                return Ok(Served::new(Response::from_stored(stored), ResponseSource::OfflineShell));
            }
        }

        tracing::warn!(url = %request.url, error = %error, "network first failed");
        Ok(Served::new(Response::offline_text(), ResponseSource::Offline))
    }

    /// Write a copy of `response` without holding up the caller. A failed
    /// write is logged and otherwise ignored.
    fn store_in_background(&self, partition: String, request: &Request, response: &Response) {
        let stored = response.to_stored(request);
        let cache = self.cache.clone();
        self.pending.spawn(async move {
            if let Err(e) = cache.put_response(&partition, &stored).await {
                tracing::warn!(partition = %partition, url = %stored.url, error = %e, "cache write failed");
            }
        });
    }
}
