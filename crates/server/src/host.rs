//! The worker instance and its collaborators, shared by every tool.

use std::sync::Arc;

use shellcache_client::Fetcher;
use shellcache_client::worker::{NotificationCenter, NotificationDispatcher, ServiceWorker, WindowRegistry};
use shellcache_core::{AppConfig, CacheDb, Error};

#[derive(Clone)]
pub struct WorkerHost {
    pub worker: Arc<ServiceWorker>,
    pub dispatcher: Arc<NotificationDispatcher>,
    pub notifications: Arc<NotificationCenter>,
    pub windows: Arc<WindowRegistry>,
}

impl WorkerHost {
    pub fn new(config: &AppConfig, cache: CacheDb, fetcher: Arc<dyn Fetcher>) -> Result<Self, Error> {
        let worker = Arc::new(ServiceWorker::new(config, cache, fetcher)?);
        let notifications = Arc::new(NotificationCenter::new());
        let windows = Arc::new(WindowRegistry::new());
        let dispatcher = Arc::new(NotificationDispatcher::new(
            notifications.clone(),
            windows.clone(),
            config.notification.clone(),
            worker.origin().clone(),
        ));

        Ok(Self { worker, dispatcher, notifications, windows })
    }
}
