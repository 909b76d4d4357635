//! cache_match tool implementation.
//!
//! Looks a GET request up across all partitions without touching the
//! network or the worker's routing.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use shellcache_client::Request;
use shellcache_client::fetch::resolve;
use shellcache_core::Error;

use crate::host::WorkerHost;
use crate::tools::json_result;

/// Parameters for the cache_match tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheMatchParams {
    /// Absolute URL, or a path resolved against the application origin.
    pub url: String,
}

/// Output from the cache_match tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheMatchOutput {
    pub url: String,
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub stored_at: String,

    /// Body, lossily decoded as UTF-8.
    pub body: String,
}

/// Implementation of the cache_match tool.
pub async fn match_impl(host: &WorkerHost, params: CacheMatchParams) -> Result<CallToolResult, McpError> {
    let url = resolve(host.worker.origin(), &params.url).map_err(Error::from)?;
    let request = Request::get(url);

    let stored = host
        .worker
        .cache()
        .match_response(&request.cache_key())
        .await?
        .ok_or_else(|| Error::CacheMiss(request.url.to_string()))?;

    let output = CacheMatchOutput {
        url: stored.url,
        status: stored.status,
        headers: stored.headers,
        stored_at: stored.stored_at,
        body: String::from_utf8_lossy(&stored.body).into_owned(),
    };
    json_result(&output)
}
