//! MCP tool implementations.
//!
//! Lifecycle and fetch tools dispatch controller events; cache tools inspect
//! the cache storage without going through the controller.

pub mod cache;
pub mod fetch;
pub mod lifecycle;

use folio_core::Response;
use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, Content},
};
use serde::Serialize;

use crate::error::ToolError;

/// Render a tool output as pretty JSON text content.
pub(crate) fn json_result<T: Serialize>(output: &T) -> Result<CallToolResult, McpError> {
    let json = serde_json::to_string_pretty(output).map_err(|e| ToolError::OutputFailed(e.to_string()))?;
    Ok(CallToolResult::success(vec![Content::text(json)]))
}

/// Body as text when it is valid UTF-8.
pub(crate) fn body_text(response: &Response) -> Option<String> {
    std::str::from_utf8(&response.body).ok().map(str::to_string)
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Arc;

    use folio_core::CacheDb;
    use folio_worker::Controller;
    use folio_worker::testing::{ScriptedNetwork, scope, site_network};
    use rmcp::model::CallToolResult;
    use serde::de::DeserializeOwned;

    /// Controller over an in-memory cache and a network serving the manifest.
    pub async fn controller() -> (Arc<Controller>, Arc<ScriptedNetwork>) {
        let scope = scope();
        let network = Arc::new(site_network(&scope));
        let cache = CacheDb::open_in_memory().await.unwrap();
        (Arc::new(Controller::new(scope, cache, network.clone())), network)
    }

    pub fn parse<T: DeserializeOwned>(result: &CallToolResult) -> T {
        let content_val = serde_json::to_value(&result.content[0]).unwrap();
        let text = content_val
            .get("text")
            .and_then(|v| v.as_str())
            .expect("Expected text field in content");
        serde_json::from_str(text).unwrap()
    }
}
