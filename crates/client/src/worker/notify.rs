//! Push notifications and notification clicks.
//!
//! The dispatcher talks to the host through two seams: [`Notifier`] shows
//! and closes notifications, [`WindowClients`] lists, focuses, and opens
//! application windows. [`NotificationCenter`] and [`WindowRegistry`] are
//! in-memory implementations of both.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use shellcache_core::{Error, NotificationDefaults};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::RwLock;
use url::Url;

use crate::fetch::resolve;

/// Inbound push payload. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct PushPayload {
    pub title: Option<String>,
    pub body: Option<String>,
    pub url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct NotificationData {
    /// Where a click on the notification should lead.
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct NotificationOptions {
    pub body: String,
    pub icon: String,
    pub badge: String,
    pub vibrate: Vec<u32>,
    pub data: NotificationData,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct Notification {
    pub id: u64,
    pub title: String,
    pub options: NotificationOptions,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct WindowClient {
    pub id: u64,
    pub url: String,
    pub focused: bool,
}

/// What a notification click did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ClickAction {
    Focused { window: WindowClient },
    Opened { window: WindowClient },
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn show(&self, title: String, options: NotificationOptions) -> Result<Notification, Error>;
    async fn close(&self, id: u64) -> Result<(), Error>;
}

#[async_trait]
pub trait WindowClients: Send + Sync {
    async fn match_all(&self) -> Result<Vec<WindowClient>, Error>;
    async fn focus(&self, id: u64) -> Result<WindowClient, Error>;
    async fn open_window(&self, url: &str) -> Result<WindowClient, Error>;
}

pub struct NotificationDispatcher {
    notifier: Arc<dyn Notifier>,
    clients: Arc<dyn WindowClients>,
    defaults: NotificationDefaults,
    origin: Url,
}

impl NotificationDispatcher {
    pub fn new(
        notifier: Arc<dyn Notifier>, clients: Arc<dyn WindowClients>, defaults: NotificationDefaults, origin: Url,
    ) -> Self {
        Self { notifier, clients, defaults, origin }
    }

    /// Fill in missing payload fields from the configured defaults. Empty
    /// strings count as missing.
    pub fn compose(&self, payload: PushPayload) -> (String, NotificationOptions) {
        let present = |field: Option<String>| field.filter(|s| !s.is_empty());

        let title = present(payload.title).unwrap_or_else(|| self.defaults.title.clone());
        let options = NotificationOptions {
            body: present(payload.body).unwrap_or_else(|| self.defaults.body.clone()),
            icon: self.defaults.icon.clone(),
            badge: self.defaults.badge.clone(),
            vibrate: self.defaults.vibrate.clone(),
            data: NotificationData { url: present(payload.url).unwrap_or_else(|| "/".to_string()) },
        };
        (title, options)
    }

    /// Show a notification for a push event.
    ///
    /// A push without data is ignored. The notification is shown before
    /// this returns.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidInput` when the data is not a JSON object of
    /// the expected shape; no notification is shown.
    pub async fn push(&self, data: Option<&str>) -> Result<Option<Notification>, Error> {
        let Some(data) = data else {
            tracing::debug!("push without data");
            return Ok(None);
        };

        let payload: PushPayload =
            serde_json::from_str(data).map_err(|e| Error::InvalidInput(format!("push payload: {e}")))?;
        let (title, options) = self.compose(payload);

        let notification = self.notifier.show(title, options).await?;
        Ok(Some(notification))
    }

    /// Close the notification and bring its target into view: focus a
    /// window already showing it, otherwise open a new one.
    pub async fn click(&self, notification: &Notification) -> Result<ClickAction, Error> {
        self.notifier.close(notification.id).await?;

        let target = match notification.options.data.url.as_str() {
            "" => "/",
            url => url,
        };
        let target = resolve(&self.origin, target)?.to_string();

        let windows = self.clients.match_all().await?;
        if let Some(window) = windows.iter().find(|w| w.url == target) {
            let window = self.clients.focus(window.id).await?;
            return Ok(ClickAction::Focused { window });
        }

        let window = self.clients.open_window(&target).await?;
        Ok(ClickAction::Opened { window })
    }
}

/// In-memory notification tray.
#[derive(Debug, Default)]
pub struct NotificationCenter {
    next_id: AtomicU64,
    shown: RwLock<Vec<Notification>>,
}

impl NotificationCenter {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, id: u64) -> Option<Notification> {
        self.shown.read().await.iter().find(|n| n.id == id).cloned()
    }

    /// Currently displayed notifications, oldest first.
    pub async fn list(&self) -> Vec<Notification> {
        self.shown.read().await.clone()
    }
}

#[async_trait]
impl Notifier for NotificationCenter {
    async fn show(&self, title: String, options: NotificationOptions) -> Result<Notification, Error> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        let notification = Notification { id, title, options };
        tracing::info!(id, title = %notification.title, url = %notification.options.data.url, "showing notification");
        self.shown.write().await.push(notification.clone());
        Ok(notification)
    }

    async fn close(&self, id: u64) -> Result<(), Error> {
        self.shown.write().await.retain(|n| n.id != id);
        Ok(())
    }
}

/// In-memory list of open application windows.
#[derive(Debug, Default)]
pub struct WindowRegistry {
    next_id: AtomicU64,
    windows: RwLock<Vec<WindowClient>>,
}

impl WindowRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn list(&self) -> Vec<WindowClient> {
        self.windows.read().await.clone()
    }
}

#[async_trait]
impl WindowClients for WindowRegistry {
    async fn match_all(&self) -> Result<Vec<WindowClient>, Error> {
        Ok(self.list().await)
    }

    async fn focus(&self, id: u64) -> Result<WindowClient, Error> {
        let mut windows = self.windows.write().await;
        if !windows.iter().any(|w| w.id == id) {
            return Err(Error::InvalidInput(format!("no window with id {id}")));
        }

        let mut focused = None;
        for window in windows.iter_mut() {
            window.focused = window.id == id;
            if window.focused {
                focused = Some(window.clone());
            }
        }
        focused.ok_or_else(|| Error::InvalidInput(format!("no window with id {id}")))
    }

    async fn open_window(&self, url: &str) -> Result<WindowClient, Error> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        let window = WindowClient { id, url: url.to_string(), focused: true };

        let mut windows = self.windows.write().await;
        for other in windows.iter_mut() {
            other.focused = false;
        }
        windows.push(window.clone());
        tracing::debug!(id, url, "opened window");
        Ok(window)
    }
}
