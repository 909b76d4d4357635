//! sw_install and sw_activate tool implementations.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use shellcache_client::worker::{ActivateReport, InstallReport, WorkerState};

use super::json_result;
use crate::host::WorkerHost;

/// Output from the sw_install tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SwInstallOutput {
    /// Static partition filled by the precache.
    pub partition: String,

    /// Number of manifest assets stored.
    pub precached: usize,

    /// Stale partitions removed when activation followed immediately.
    pub deleted: Option<Vec<String>>,

    /// Worker state after the call.
    pub state: WorkerState,
}

/// Output from the sw_activate tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SwActivateOutput {
    pub deleted: Vec<String>,
    pub already_active: bool,
    pub claimed: bool,
    pub state: WorkerState,
}

/// Implementation of the sw_install tool.
///
/// Installs and, since install always asks to skip waiting, activates in
/// the same call.
pub async fn install_impl(host: &WorkerHost) -> Result<CallToolResult, McpError> {
    let (InstallReport { partition, precached }, activated) = host.worker.register().await?;

    let output = SwInstallOutput {
        partition,
        precached,
        deleted: activated.map(|report| report.deleted),
        state: host.worker.state(),
    };
    json_result(&output)
}

/// Implementation of the sw_activate tool.
pub async fn activate_impl(host: &WorkerHost) -> Result<CallToolResult, McpError> {
    let ActivateReport { deleted, already_active } = host.worker.activate().await?;

    let output =
        SwActivateOutput { deleted, already_active, claimed: host.worker.is_claimed(), state: host.worker.state() };
    json_result(&output)
}
