//! sw_message tool implementation.
//!
//! Posts a control message to the worker. A purge answers on a reply port,
//! which this tool waits on and reports.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use shellcache_client::worker::{ClearCacheReply, ControlMessage, WorkerState};
use tokio::sync::oneshot;

use super::json_result;
use crate::host::WorkerHost;

/// Parameters for the sw_message tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SwMessageParams {
    /// Message literal: "SKIP_WAITING" or "CLEAR_CACHE". Anything else is ignored.
    pub data: String,
}

/// Output from the sw_message tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SwMessageOutput {
    /// False when the message was not a known control message.
    pub handled: bool,

    /// Reply received on the port, for messages that answer.
    pub reply: Option<ClearCacheReply>,

    pub state: WorkerState,
}

/// Implementation of the sw_message tool.
pub async fn message_impl(host: &WorkerHost, params: SwMessageParams) -> Result<CallToolResult, McpError> {
    let (handled, reply) = match ControlMessage::parse(&params.data) {
        Some(ControlMessage::ClearCache) => {
            let (tx, rx) = oneshot::channel();
            let result = host.worker.handle_message(ControlMessage::ClearCache, Some(tx)).await;
            // A failed purge still answers, with success: false.
            if let Err(e) = &result {
                tracing::debug!(error = %e, "CLEAR_CACHE failed");
            }
            (true, rx.await.ok())
        }
        Some(message) => {
            host.worker.handle_message(message, None).await?;
            (true, None)
        }
        None => {
            tracing::debug!(data = %params.data, "ignoring unknown message");
            (false, None)
        }
    };

    json_result(&SwMessageOutput { handled, reply, state: host.worker.state() })
}
