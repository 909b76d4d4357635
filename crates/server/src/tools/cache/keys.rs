//! cache_keys tool implementation.
//!
//! Lists every cache partition with its entry count, and the names the
//! running worker considers current.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use shellcache_core::PartitionInfo;

use crate::host::WorkerHost;
use crate::tools::json_result;

/// Output from the cache_keys tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheKeysOutput {
    /// Partitions in creation order.
    pub partitions: Vec<PartitionInfo>,

    /// Prefix shared by every partition this application owns.
    pub prefix: String,

    /// Partition names belonging to the running cache version.
    pub current: Vec<String>,

    /// Umbrella partition name from earlier releases; reaped on activation.
    pub legacy: String,
}

/// Implementation of the cache_keys tool.
pub async fn keys_impl(host: &WorkerHost) -> Result<CallToolResult, McpError> {
    let version = host.worker.version();
    let partitions = host.worker.cache().partitions().await?;

    let output = CacheKeysOutput {
        partitions,
        prefix: version.prefix().to_string(),
        current: Vec::from(version.current()),
        legacy: version.legacy_name(),
    };
    json_result(&output)
}
