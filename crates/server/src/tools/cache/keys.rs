//! cache_keys tool implementation.
//!
//! Lists bucket names in creation order.

use folio_worker::Controller;
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::tools::json_result;

/// Output from the cache_keys tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheKeysOutput {
    /// Name of the bucket the controller reads and writes.
    pub current: String,
    pub buckets: Vec<String>,
}

/// Implementation of the cache_keys tool.
pub async fn keys_impl(controller: &Controller) -> Result<CallToolResult, McpError> {
    let buckets = controller.cache().bucket_names().await?;
    json_result(&CacheKeysOutput { current: controller.scope().cache_name().to_string(), buckets })
}
