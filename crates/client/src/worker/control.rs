//! Out-of-band control messages from controlled pages.

use serde::{Deserialize, Serialize};
use shellcache_core::Error;
use tokio::sync::oneshot;

use super::ServiceWorker;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlMessage {
    /// Activate a waiting worker without waiting for pages to close.
    SkipWaiting,
    /// Drop every partition and acknowledge on the reply port.
    ClearCache,
}

impl ControlMessage {
    /// Parse the bare message literal. Anything else is not a control
    /// message.
    pub fn parse(data: &str) -> Option<Self> {
        match data {
            "SKIP_WAITING" => Some(Self::SkipWaiting),
            "CLEAR_CACHE" => Some(Self::ClearCache),
            _ => None,
        }
    }
}

/// Acknowledgement sent after a purge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct ClearCacheReply {
    pub success: bool,
}

pub type ReplyPort = oneshot::Sender<ClearCacheReply>;

impl ServiceWorker {
    /// Handle a control message.
    ///
    /// `SkipWaiting` activates an installed worker and is a no-op otherwise.
    /// `ClearCache` deletes every partition, whatever its prefix, then
    /// replies on `port`; a storage failure replies `success: false` and is
    /// returned.
    pub async fn handle_message(&self, message: ControlMessage, port: Option<ReplyPort>) -> Result<(), Error> {
        match message {
            ControlMessage::SkipWaiting => {
                if self.skip_waiting() {
                    self.activate().await?;
                }
                Ok(())
            }
            ControlMessage::ClearCache => {
                let result = self.clear_all().await;
                if let Err(e) = &result {
                    tracing::warn!(error = %e, "cache purge failed");
                }

                if let Some(port) = port
                    && port.send(ClearCacheReply { success: result.is_ok() }).is_err()
                {
                    tracing::debug!("reply port closed before purge finished");
                }

                result.map(|_| ())
            }
        }
    }

    /// Parse and handle a raw message. Unknown messages are ignored.
    pub async fn handle_raw_message(&self, data: &str, port: Option<ReplyPort>) -> Result<bool, Error> {
        match ControlMessage::parse(data) {
            Some(message) => self.handle_message(message, port).await.map(|_| true),
            None => {
                tracing::debug!(data, "ignoring unknown message");
                Ok(false)
            }
        }
    }
}
