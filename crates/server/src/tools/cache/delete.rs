//! cache_delete tool implementation.
//!
//! Deletes one whole bucket. There is no finer-grained eviction.

use folio_worker::Controller;
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::ToolError;
use crate::tools::json_result;

/// Parameters for the cache_delete tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheDeleteParams {
    /// Name of the bucket to delete.
    pub bucket: String,
}

/// Output from the cache_delete tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheDeleteOutput {
    pub bucket: String,
    /// False if no bucket had that name.
    pub deleted: bool,
}

/// Implementation of the cache_delete tool.
pub async fn delete_impl(controller: &Controller, params: CacheDeleteParams) -> Result<CallToolResult, McpError> {
    if params.bucket.trim().is_empty() {
        return Err(ToolError::InvalidInput("bucket cannot be empty".into()).into());
    }

    let deleted = controller.cache().delete_bucket(&params.bucket).await?;
    if deleted && params.bucket == controller.scope().cache_name() {
        tracing::warn!(bucket = %params.bucket, "deleted the current bucket; pages fall back to the network");
    }

    json_result(&CacheDeleteOutput { bucket: params.bucket, deleted })
}
