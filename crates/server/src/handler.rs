//! MCP server handler implementation.
//!
//! Routes tool calls to the worker events and cache views in [`crate::tools`].
use crate::host::WorkerHost;
use crate::tools::cache::{CacheMatchParams, keys_impl, match_impl};
use crate::tools::{SwFetchParams, SwMessageParams, SwNotificationClickParams, SwPushParams};
use crate::tools::{fetch, lifecycle, message, notify};

use rmcp::{
    ErrorData as McpError, ServerHandler,
    handler::server::{
        tool::{ToolCallContext, ToolRouter},
        wrapper::Parameters,
    },
    model::{
        CallToolRequestParam, CallToolResult, Implementation, ListToolsResult, PaginatedRequestParam, ProtocolVersion,
        ServerCapabilities, ServerInfo,
    },
    service::{RequestContext, RoleServer},
    tool, tool_router,
};

/// MCP front end for one offline-caching worker.
#[derive(Clone)]
pub struct ShellCacheServer {
    host: WorkerHost,
    tool_router: ToolRouter<Self>,
}

#[tool_router]
impl ShellCacheServer {
    pub fn new(host: WorkerHost) -> Self {
        Self { host, tool_router: Self::tool_router() }
    }

    /// Precache the static asset manifest, then activate.
    #[tool(
        description = "Install the worker: precache the static asset manifest into the current static partition, then activate (skip-waiting is always requested). Fails and leaves the worker redundant if any asset cannot be fetched."
    )]
    async fn sw_install(&self) -> Result<CallToolResult, McpError> {
        lifecycle::install_impl(&self.host).await
    }

    #[tool(
        description = "Activate an installed worker: delete stale partitions of this app's prefix and claim open pages. No-op when already active."
    )]
    async fn sw_activate(&self) -> Result<CallToolResult, McpError> {
        lifecycle::activate_impl(&self.host).await
    }

    /// Dispatch one request through the worker.
    #[tool(
        description = "Send a request through the worker's fetch handler. Reports the route (cache_first, network_first, or passthrough), where the response came from, and the response itself. Offline requests degrade to cached copies, the cached shell for navigations, or a 503."
    )]
    async fn sw_fetch(&self, params: Parameters<SwFetchParams>) -> Result<CallToolResult, McpError> {
        fetch::fetch_impl(&self.host, params.0).await
    }

    #[tool(
        description = "Post a control message to the worker. SKIP_WAITING activates a waiting worker; CLEAR_CACHE deletes every cache partition and reports the reply. Other messages are ignored."
    )]
    async fn sw_message(&self, params: Parameters<SwMessageParams>) -> Result<CallToolResult, McpError> {
        message::message_impl(&self.host, params.0).await
    }

    #[tool(
        description = "Deliver a push event. The optional JSON payload may set title, body, and url; missing fields use the configured defaults. Returns the notification shown."
    )]
    async fn sw_push(&self, params: Parameters<SwPushParams>) -> Result<CallToolResult, McpError> {
        notify::push_impl(&self.host, params.0).await
    }

    #[tool(
        description = "Click a displayed notification: closes it, then focuses a window already at its URL or opens a new one."
    )]
    async fn sw_notification_click(
        &self, params: Parameters<SwNotificationClickParams>,
    ) -> Result<CallToolResult, McpError> {
        notify::click_impl(&self.host, params.0).await
    }

    #[tool(description = "List cache partitions with entry counts, and the partition names of the running version.")]
    async fn cache_keys(&self) -> Result<CallToolResult, McpError> {
        keys_impl(&self.host).await
    }

    #[tool(description = "Look up a cached GET response by URL across all partitions. Never touches the network.")]
    async fn cache_match(&self, params: Parameters<CacheMatchParams>) -> Result<CallToolResult, McpError> {
        match_impl(&self.host, params.0).await
    }
}

impl ServerHandler for ShellCacheServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            server_info: Implementation {
                name: "shellcache".into(),
                version: env!("CARGO_PKG_VERSION").into(),
                ..Default::default()
            },
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            instructions: Some(
                "Drives an offline-caching worker for the application shell. Call sw_install first, then sw_fetch."
                    .into(),
            ),
            ..Default::default()
        }
    }

    async fn list_tools(
        &self, _request: Option<PaginatedRequestParam>, _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, rmcp::model::ErrorData> {
        Ok(ListToolsResult { meta: None, tools: self.tool_router.list_all(), next_cursor: None })
    }

    async fn call_tool(
        &self, request: CallToolRequestParam, context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, rmcp::model::ErrorData> {
        self.tool_router
            .call(ToolCallContext::new(self, request, context))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::testing::test_host;

    #[tokio::test]
    async fn test_lists_all_tools() {
        let (host, _) = test_host().await;
        let server = ShellCacheServer::new(host);

        let mut names: Vec<String> = server.tool_router.list_all().into_iter().map(|t| t.name.to_string()).collect();
        names.sort();
        assert_eq!(
            names,
            vec![
                "cache_keys",
                "cache_match",
                "sw_activate",
                "sw_fetch",
                "sw_install",
                "sw_message",
                "sw_notification_click",
                "sw_push"
            ]
        );
    }

    #[tokio::test]
    async fn test_server_info() {
        let (host, _) = test_host().await;
        let info = ShellCacheServer::new(host).get_info();
        assert_eq!(info.server_info.name, "shellcache");
    }
}
