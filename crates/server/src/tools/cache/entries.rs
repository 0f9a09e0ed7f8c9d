//! cache_entries tool implementation.
//!
//! Lists the entries of one bucket.

use folio_core::CachedEntry;
use folio_worker::Controller;
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::tools::json_result;

/// Parameters for the cache_entries tool.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct CacheEntriesParams {
    /// Bucket to list (default: the current bucket).
    #[serde(default)]
    pub bucket: Option<String>,
}

/// Output from the cache_entries tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheEntriesOutput {
    pub bucket: String,
    pub entries: Vec<CachedEntry>,
}

/// Implementation of the cache_entries tool.
pub async fn entries_impl(controller: &Controller, params: CacheEntriesParams) -> Result<CallToolResult, McpError> {
    let bucket = params
        .bucket
        .unwrap_or_else(|| controller.scope().cache_name().to_string());
    let entries = controller.cache().entries(&bucket).await?;

    json_result(&CacheEntriesOutput { bucket, entries })
}
