//! Offline-caching worker.
//!
//! A [`ServiceWorker`] owns one cache generation (see [`CacheVersion`]) and
//! answers intercepted requests from the partitions of that generation or
//! the network. The host drives it through lifecycle calls
//! ([`ServiceWorker::install`], [`ServiceWorker::activate`]), per-request
//! [`ServiceWorker::handle_fetch`], and control messages.
//!
//! Concurrent fetches share nothing but the cache storage, which serialises
//! its own writes. Cache writes that follow a network response run in the
//! background and are tracked so [`ServiceWorker::settle`] can wait for them.

pub mod assets;
pub mod control;
pub mod lifecycle;
pub mod notify;
pub mod router;
pub mod strategy;
pub mod version;

#[cfg(test)]
mod testing;
#[cfg(test)]
mod tests;

use futures_util::future::try_join_all;
use serde::Serialize;
use shellcache_core::{AppConfig, CacheDb, Error};
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::task::JoinHandle;
use url::Url;

use crate::fetch::{Fetcher, resolve};
use crate::http::Request;

pub use assets::{CacheablePatterns, StaticManifest};
pub use control::{ClearCacheReply, ControlMessage, ReplyPort};
pub use lifecycle::{Lifecycle, WorkerState};
pub use notify::{
    ClickAction, Notification, NotificationCenter, NotificationData, NotificationDispatcher, NotificationOptions,
    Notifier, PushPayload, WindowClient, WindowClients, WindowRegistry,
};
pub use router::{NetworkReason, PassReason, Route, Router};
pub use strategy::{ResponseSource, Served};
pub use version::CacheVersion;

/// What the worker did with an intercepted request.
#[derive(Debug, Clone)]
pub enum FetchOutcome {
    /// Not intercepted; the host sends the request natively.
    Passthrough(PassReason),
    /// Answered by a strategy.
    Responded { route: Route, served: Served },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, schemars::JsonSchema)]
pub struct InstallReport {
    pub partition: String,
    pub precached: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, schemars::JsonSchema)]
pub struct ActivateReport {
    /// Stale partitions removed by this activation.
    pub deleted: Vec<String>,
    /// True when the worker was already active and nothing ran.
    pub already_active: bool,
}

/// Background cache writes that the worker must see through.
#[derive(Debug, Default)]
pub(crate) struct PendingWrites {
    handles: Mutex<Vec<JoinHandle<()>>>,
}

impl PendingWrites {
    fn lock(&self) -> MutexGuard<'_, Vec<JoinHandle<()>>> {
        self.handles.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn spawn<F>(&self, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let handle = tokio::spawn(task);
        let mut handles = self.lock();
        handles.retain(|h| !h.is_finished());
        handles.push(handle);
    }

    /// Wait for every write spawned so far, including ones spawned while
    /// waiting.
    pub(crate) async fn settle(&self) {
        loop {
            let handles = std::mem::take(&mut *self.lock());
            if handles.is_empty() {
                return;
            }
            for handle in handles {
                if let Err(e) = handle.await {
                    tracing::warn!(error = %e, "background cache write panicked");
                }
            }
        }
    }
}

pub struct ServiceWorker {
    cache: CacheDb,
    fetcher: Arc<dyn Fetcher>,
    version: CacheVersion,
    router: Router,
    origin: Url,
    lifecycle: Mutex<Lifecycle>,
    pending: PendingWrites,
}

impl ServiceWorker {
    /// Build a worker for the cache generation named in `config`.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidUrl` for an unparsable origin and
    /// `Error::InvalidInput` for a cacheable pattern that fails to compile.
    pub fn new(config: &AppConfig, cache: CacheDb, fetcher: Arc<dyn Fetcher>) -> Result<Self, Error> {
        let origin = Url::parse(&config.origin).map_err(|e| Error::InvalidUrl(format!("{}: {e}", config.origin)))?;

        Ok(Self {
            cache,
            fetcher,
            version: CacheVersion::new(config.cache_prefix.clone(), config.cache_version.clone()),
            router: Router::from_config(config)?,
            origin,
            lifecycle: Mutex::new(Lifecycle::default()),
            pending: PendingWrites::default(),
        })
    }

    fn lifecycle(&self) -> MutexGuard<'_, Lifecycle> {
        self.lifecycle.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn state(&self) -> WorkerState {
        self.lifecycle().state()
    }

    pub fn is_claimed(&self) -> bool {
        self.lifecycle().is_claimed()
    }

    pub fn version(&self) -> &CacheVersion {
        &self.version
    }

    pub fn router(&self) -> &Router {
        &self.router
    }

    pub fn origin(&self) -> &Url {
        &self.origin
    }

    pub fn cache(&self) -> &CacheDb {
        &self.cache
    }

    pub fn fetcher(&self) -> &Arc<dyn Fetcher> {
        &self.fetcher
    }

    /// Precache the static manifest into the static partition.
    ///
    /// All manifest paths are fetched concurrently. If any of them fails or
    /// answers with a non-2xx status nothing is written and the worker turns
    /// redundant. Install always asks to skip waiting, so hosts activate a
    /// freshly installed worker immediately.
    pub async fn install(&self) -> Result<InstallReport, Error> {
        self.lifecycle().begin_install()?;

        let partition = self.version.static_name();
        let manifest = self.router.manifest();
        if manifest.is_empty() {
            tracing::warn!(partition = %partition, "static manifest is empty; nothing will be served cache-first");
        }
        tracing::info!(partition = %partition, assets = manifest.len(), "caching static assets");

        let result = self.precache(&partition).await;

        {
            let mut lifecycle = self.lifecycle();
            lifecycle.finish_install(result.is_ok());
            lifecycle.request_skip_waiting();
        }

        match result {
            Ok(precached) => Ok(InstallReport { partition, precached }),
            Err(e) => {
                tracing::warn!(error = %e, "install failed; worker is redundant");
                Err(e)
            }
        }
    }

    async fn precache(&self, partition: &str) -> Result<usize, Error> {
        let requests = self
            .router
            .manifest()
            .paths()
            .iter()
            .map(|path| -> Result<(&str, Request), Error> { Ok((path.as_str(), Request::get(resolve(&self.origin, path)?))) })
            .collect::<Result<Vec<_>, _>>()?;

        let stored = try_join_all(requests.iter().map(|(path, request)| async move {
            let response = self
                .fetcher
                .fetch(request)
                .await
                .map_err(|e| Error::PrecacheFailed { path: path.to_string(), reason: e.to_string() })?;

            if !response.ok() {
                return Err(Error::PrecacheFailed {
                    path: path.to_string(),
                    reason: format!("status {}", response.status.as_u16()),
                });
            }

            Ok(response.to_stored(request))
        }))
        .await?;

        let count = stored.len();
        self.cache.put_responses(partition, stored).await?;
        Ok(count)
    }

    /// Delete stale partitions and take control of open pages.
    ///
    /// A no-op on an already active worker. Fetches racing the deletion may
    /// still read a partition that is about to go away.
    pub async fn activate(&self) -> Result<ActivateReport, Error> {
        let should_run = self.lifecycle().begin_activate()?;
        if !should_run {
            return Ok(ActivateReport { deleted: Vec::new(), already_active: true });
        }

        match self.reap().await {
            Ok(deleted) => {
                self.lifecycle().finish_activate();
                tracing::info!(version = %self.version.version(), deleted = deleted.len(), "worker activated");
                Ok(ActivateReport { deleted, already_active: false })
            }
            Err(e) => {
                self.lifecycle().abort_activate();
                Err(e)
            }
        }
    }

    async fn reap(&self) -> Result<Vec<String>, Error> {
        let stale: Vec<String> = self
            .cache
            .partition_names()
            .await?
            .into_iter()
            .filter(|name| self.version.is_stale(name))
            .collect();

        try_join_all(stale.iter().map(|name| async move {
            tracing::info!(partition = %name, "deleting old cache");
            self.cache.delete_partition(name).await
        }))
        .await?;

        Ok(stale)
    }

    /// Record a skip-waiting request; true when activation should run now.
    pub fn skip_waiting(&self) -> bool {
        self.lifecycle().request_skip_waiting()
    }

    /// Install, then activate straight away if skip-waiting was requested.
    pub async fn register(&self) -> Result<(InstallReport, Option<ActivateReport>), Error> {
        let installed = self.install().await?;
        let skip_waiting = self.lifecycle().skip_waiting_requested();
        let activated = if skip_waiting { Some(self.activate().await?) } else { None };
        Ok((installed, activated))
    }

    /// Route an intercepted request and answer it.
    ///
    /// Network failures never surface here; they degrade to cached or
    /// synthetic offline responses. Cache read failures do propagate.
    pub async fn handle_fetch(&self, request: &Request) -> Result<FetchOutcome, Error> {
        let route = self.router.route(request);
        tracing::debug!(method = %request.method, url = %request.url, ?route, "routing request");

        let served = match route {
            Route::Passthrough(reason) => return Ok(FetchOutcome::Passthrough(reason)),
            Route::CacheFirst => self.cache_first(request).await?,
            Route::NetworkFirst(_) => self.network_first(request).await?,
        };

        Ok(FetchOutcome::Responded { route, served })
    }

    /// Wait for outstanding background cache writes.
    pub async fn settle(&self) {
        self.pending.settle().await;
    }

    /// Delete every partition, whatever its prefix.
    pub async fn clear_all(&self) -> Result<Vec<String>, Error> {
        self.settle().await;

        let names = self.cache.partition_names().await?;
        try_join_all(names.iter().map(|name| self.cache.delete_partition(name))).await?;

        tracing::info!(deleted = names.len(), "all caches cleared");
        Ok(names)
    }
}
