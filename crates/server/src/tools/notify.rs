//! sw_push and sw_notification_click tool implementations.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use shellcache_client::worker::Notification;

use super::json_result;
use crate::error::ToolError;
use crate::host::WorkerHost;

/// Parameters for the sw_push tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SwPushParams {
    /// Push payload as JSON text, e.g. {"title":"…","body":"…","url":"/alerts"}.
    /// Omit for a push without data.
    pub data: Option<String>,
}

/// Output from the sw_push tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SwPushOutput {
    /// The notification shown, if any.
    pub notification: Option<Notification>,
}

/// Parameters for the sw_notification_click tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SwNotificationClickParams {
    /// Id returned by sw_push.
    pub notification_id: u64,
}

/// Implementation of the sw_push tool.
pub async fn push_impl(host: &WorkerHost, params: SwPushParams) -> Result<CallToolResult, McpError> {
    let notification = host.dispatcher.push(params.data.as_deref()).await?;
    json_result(&SwPushOutput { notification })
}

/// Implementation of the sw_notification_click tool.
pub async fn click_impl(host: &WorkerHost, params: SwNotificationClickParams) -> Result<CallToolResult, McpError> {
    let notification = host
        .notifications
        .get(params.notification_id)
        .await
        .ok_or(ToolError::UnknownNotification(params.notification_id))?;

    let action = host.dispatcher.click(&notification).await?;
    json_result(&action)
}
