//! Structured errors for the shellcache server.
//!
//! Tool-level failures that don't come from the engine itself.

use rmcp::model::{ErrorCode, ErrorData as McpError};

#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    /// Invalid input parameters (e.g., unknown HTTP method).
    #[error("INVALID_INPUT: {0}")]
    InvalidInput(String),

    /// No displayed notification carries this id.
    #[error("UNKNOWN_NOTIFICATION: {0}")]
    UnknownNotification(u64),
}

impl From<ToolError> for McpError {
    fn from(err: ToolError) -> Self {
        let (code, message) = match &err {
            ToolError::InvalidInput(msg) => (-32602, msg.clone()),
            ToolError::UnknownNotification(id) => (-32015, format!("no notification with id {id}")),
        };

        McpError { code: ErrorCode(code), message: message.into(), data: None }
    }
}
