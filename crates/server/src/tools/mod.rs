//! MCP tool implementations.
//!
//! Each tool maps one worker event (lifecycle, fetch, message, push,
//! notification click) or one cache inspection onto a JSON result.

pub mod cache;
pub mod fetch;
pub mod lifecycle;
pub mod message;
pub mod notify;

use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, Content},
};
use serde::Serialize;
use shellcache_core::Error;

pub use fetch::SwFetchParams;
pub use message::SwMessageParams;
pub use notify::{SwNotificationClickParams, SwPushParams};

/// Serialize a tool output as pretty JSON text content.
pub(crate) fn json_result<T: Serialize>(output: &T) -> Result<CallToolResult, McpError> {
    let json = serde_json::to_string_pretty(output)
        .map_err(|e| Error::InvalidInput(format!("Failed to serialize output: {e}")))?;

    Ok(CallToolResult::success(vec![Content::text(json)]))
}
