//! Test doubles for worker tests.

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::StatusCode;
use reqwest::header::{CONTENT_TYPE, HeaderValue};
use shellcache_core::{AppConfig, CacheDb};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use super::ServiceWorker;
use crate::fetch::{FetchError, Fetcher};
use crate::http::{Request, Response};

pub(crate) const ORIGIN: &str = "https://grail.test";

/// Fetcher answering from a route table, with an offline switch and a call
/// counter. Unknown URLs answer 404.
pub(crate) struct StubFetcher {
    routes: Mutex<HashMap<String, (u16, &'static str, Bytes)>>,
    online: AtomicBool,
    calls: AtomicUsize,
}

impl StubFetcher {
    pub(crate) fn new() -> Self {
        Self { routes: Mutex::new(HashMap::new()), online: AtomicBool::new(true), calls: AtomicUsize::new(0) }
    }

    pub(crate) fn route(self, path: &str, status: u16, content_type: &'static str, body: &str) -> Self {
        self.set_route(path, status, content_type, body);
        self
    }

    pub(crate) fn set_route(&self, path: &str, status: u16, content_type: &'static str, body: &str) {
        let url = format!("{ORIGIN}{path}");
        self.routes
            .lock()
            .unwrap()
            .insert(url, (status, content_type, Bytes::copy_from_slice(body.as_bytes())));
    }

    pub(crate) fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::SeqCst);
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Fetcher for StubFetcher {
    async fn fetch(&self, request: &Request) -> Result<Response, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.online.load(Ordering::SeqCst) {
            return Err(FetchError::Network("offline".into()));
        }

        let route = self.routes.lock().unwrap().get(request.url.as_str()).cloned();
        let mut response = match route {
            Some((status, content_type, body)) => {
                let mut response = Response::new(StatusCode::from_u16(status).unwrap(), body);
                response
                    .headers
                    .insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
                response
            }
            None => Response::new(StatusCode::NOT_FOUND, "Not Found"),
        };
        response.url = Some(request.url.clone());
        Ok(response)
    }
}

/// Shell with two manifest entries, both served by [`shell_fetcher`].
pub(crate) fn test_config() -> AppConfig {
    AppConfig {
        origin: ORIGIN.into(),
        static_assets: vec!["/".into(), "/manifest.json".into()],
        ..Default::default()
    }
}

pub(crate) fn shell_fetcher() -> StubFetcher {
    StubFetcher::new()
        .route("/", 200, "text/html", "<html><body>shell</body></html>")
        .route("/manifest.json", 200, "application/manifest+json", r#"{"name":"Holy Grail"}"#)
}

pub(crate) fn worker_with(config: &AppConfig, cache: CacheDb, fetcher: Arc<StubFetcher>) -> ServiceWorker {
    ServiceWorker::new(config, cache, fetcher).unwrap()
}

pub(crate) async fn test_worker(fetcher: Arc<StubFetcher>) -> ServiceWorker {
    let cache = CacheDb::open_in_memory().await.unwrap();
    worker_with(&test_config(), cache, fetcher)
}
