//! cache_match tool implementation.
//!
//! Looks up the stored response for a request descriptor without touching
//! the network.

use std::collections::BTreeMap;

use folio_client::resolve;
use folio_core::{Error, Request, ResponseKind};
use folio_worker::Controller;
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::ToolError;
use crate::tools::{body_text, json_result};

/// Parameters for the cache_match tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheMatchParams {
    /// URL to look up. Paths resolve against the site origin.
    pub url: String,

    /// Bucket to search (default: the current bucket).
    #[serde(default)]
    pub bucket: Option<String>,

    /// HTTP method of the stored request (default: GET).
    #[serde(default = "default_method")]
    pub method: String,
}

fn default_method() -> String {
    "GET".into()
}

/// Output from the cache_match tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheMatchOutput {
    pub bucket: String,
    pub url: String,
    pub status: u16,
    pub status_text: String,
    pub kind: ResponseKind,
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    /// Stored body, when it is valid UTF-8.
    pub body: Option<String>,
    pub body_len: usize,
}

/// Implementation of the cache_match tool.
pub async fn match_impl(controller: &Controller, params: CacheMatchParams) -> Result<CallToolResult, McpError> {
    if params.url.trim().is_empty() {
        return Err(ToolError::InvalidInput("url cannot be empty".into()).into());
    }

    let url = resolve(controller.scope().origin(), &params.url).map_err(|e| ToolError::InvalidInput(e.to_string()))?;
    let request = Request::new(params.method.trim(), url);
    let bucket = params
        .bucket
        .unwrap_or_else(|| controller.scope().cache_name().to_string());

    let response = controller
        .cache()
        .match_entry(&bucket, &request)
        .await?
        .ok_or_else(|| Error::CacheMiss(format!("{request} in {bucket}")))?;

    let output = CacheMatchOutput {
        bucket,
        url: request.url().to_string(),
        status: response.status,
        status_text: response.status_text.clone(),
        kind: response.kind,
        body: body_text(&response),
        body_len: response.body.len(),
        headers: response.headers,
    };

    json_result(&output)
}
