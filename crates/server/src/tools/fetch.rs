//! sw_fetch tool implementation.
//!
//! Hands one request to the worker's fetch handler. Requests the worker
//! declines to intercept are sent natively, the way a browser would.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use shellcache_client::fetch::resolve;
use shellcache_client::http::Method;
use shellcache_client::http::header::{ACCEPT, HeaderValue};
use shellcache_client::worker::{PassReason, ResponseSource, Route};
use shellcache_client::{FetchOutcome, Fetcher, Request, Response};
use shellcache_core::Error;

use super::json_result;
use crate::error::ToolError;
use crate::host::WorkerHost;

/// Parameters for the sw_fetch tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SwFetchParams {
    /// Absolute URL, or a path resolved against the application origin.
    pub url: String,

    /// HTTP method.
    #[serde(default = "default_method")]
    pub method: String,

    /// Accept header, e.g. "text/html" for a page navigation.
    pub accept: Option<String>,
}

fn default_method() -> String {
    "GET".to_string()
}

/// Output from the sw_fetch tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SwFetchOutput {
    /// Final request URL.
    pub url: String,

    /// False when the worker let the request through untouched.
    pub intercepted: bool,

    /// Route taken by an intercepted request.
    pub route: Option<Route>,

    /// Why the request was not intercepted.
    pub passthrough: Option<PassReason>,

    /// Where an intercepted response came from.
    pub source: Option<ResponseSource>,

    pub status: u16,
    pub content_type: Option<String>,
    pub headers: Vec<(String, String)>,

    /// Response body, lossily decoded as UTF-8.
    pub body: String,
}

impl SwFetchOutput {
    fn new(url: String, response: &Response) -> Self {
        let headers = response
            .headers
            .iter()
            .filter_map(|(name, value)| value.to_str().ok().map(|v| (name.to_string(), v.to_string())))
            .collect();

        Self {
            url,
            intercepted: false,
            route: None,
            passthrough: None,
            source: None,
            status: response.status.as_u16(),
            content_type: response.content_type().map(str::to_string),
            headers,
            body: String::from_utf8_lossy(&response.body).into_owned(),
        }
    }
}

fn build_request(host: &WorkerHost, params: &SwFetchParams) -> Result<Request, McpError> {
    let url = resolve(host.worker.origin(), &params.url).map_err(Error::from)?;
    let method = Method::from_bytes(params.method.trim().to_ascii_uppercase().as_bytes())
        .map_err(|_| ToolError::InvalidInput(format!("invalid HTTP method: {}", params.method)))?;

    let mut request = Request::new(method, url);
    if let Some(accept) = &params.accept {
        let value = HeaderValue::from_str(accept)
            .map_err(|_| ToolError::InvalidInput(format!("invalid Accept header: {accept}")))?;
        request = request.with_header(ACCEPT, value);
    }
    Ok(request)
}

/// Implementation of the sw_fetch tool.
pub async fn fetch_impl(host: &WorkerHost, params: SwFetchParams) -> Result<CallToolResult, McpError> {
    let request = build_request(host, &params)?;
    let url = request.url.to_string();

    let output = match host.worker.handle_fetch(&request).await? {
        FetchOutcome::Passthrough(reason) => {
            let response = host.worker.fetcher().fetch(&request).await.map_err(Error::from)?;
            SwFetchOutput { passthrough: Some(reason), ..SwFetchOutput::new(url, &response) }
        }
        FetchOutcome::Responded { route, served } => SwFetchOutput {
            intercepted: true,
            route: Some(route),
            source: Some(served.source),
            ..SwFetchOutput::new(url, &served.response)
        },
    };

    json_result(&output)
}
