//! MCP server handler implementation.
//!
//! Each tool maps to one controller event or one cache storage query.

use std::sync::Arc;

use folio_worker::Controller;
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

use crate::tools::cache::{
    CacheDeleteParams, CacheEntriesParams, CacheMatchParams, delete_impl, entries_impl, keys_impl, match_impl,
};
use crate::tools::fetch::{SwFetchParams, fetch_impl};
use crate::tools::lifecycle::{activate_impl, install_impl, status_impl};

/// The MCP server handler for folio-sw.
#[derive(Clone)]
pub struct FolioServer {
    tool_router: ToolRouter<Self>,
    controller: Arc<Controller>,
}

#[tool_router]
impl FolioServer {
    pub fn new(controller: Arc<Controller>) -> Self {
        Self { tool_router: Self::tool_router(), controller }
    }

    /// Fetch every core asset into the current bucket.
    #[tool(description = "Run the install step: fetch every core asset and store it in the current cache bucket. \
                          Fails without writing anything if any asset cannot be fetched.")]
    async fn sw_install(&self) -> Result<CallToolResult, McpError> {
        install_impl(&self.controller).await
    }

    #[tool(description = "Run the activate step: delete every cache bucket except the current one and start \
                          intercepting fetches.")]
    async fn sw_activate(&self) -> Result<CallToolResult, McpError> {
        activate_impl(&self.controller).await
    }

    #[tool(description = "Report lifecycle state, site origin, core assets and the buckets in cache storage.")]
    async fn sw_status(&self) -> Result<CallToolResult, McpError> {
        status_impl(&self.controller).await
    }

    /// Route a request through the worker.
    ///
    /// Pages go network-first, assets cache-first, and the cached offline
    /// page answers when both fail.
    #[tool(description = "Issue a request as a page of the site would. Returns whether the worker passed it \
                          through, answered it (from network, cache or the offline page) or could not answer.")]
    async fn sw_fetch(&self, params: Parameters<SwFetchParams>) -> Result<CallToolResult, McpError> {
        fetch_impl(&self.controller, params.0).await
    }

    #[tool(description = "List cache bucket names and the current bucket.")]
    async fn cache_keys(&self) -> Result<CallToolResult, McpError> {
        keys_impl(&self.controller).await
    }

    #[tool(description = "List the entries stored in a cache bucket (default: the current bucket).")]
    async fn cache_entries(&self, params: Parameters<CacheEntriesParams>) -> Result<CallToolResult, McpError> {
        entries_impl(&self.controller, params.0).await
    }

    #[tool(description = "Look up the stored response for a URL without touching the network.")]
    async fn cache_match(&self, params: Parameters<CacheMatchParams>) -> Result<CallToolResult, McpError> {
        match_impl(&self.controller, params.0).await
    }

    #[tool(description = "Delete a whole cache bucket by name.")]
    async fn cache_delete(&self, params: Parameters<CacheDeleteParams>) -> Result<CallToolResult, McpError> {
        delete_impl(&self.controller, params.0).await
    }
}

impl ServerHandler for FolioServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            server_info: Implementation {
                name: "folio-sw".into(),
                version: env!("CARGO_PKG_VERSION").into(),
                ..Default::default()
            },
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            instructions: Some(
                "Offline cache worker for a static site. Call sw_install, then sw_activate, then sw_fetch.".into(),
            ),
            ..Default::default()
        }
    }

    async fn list_tools(
        &self, _request: Option<PaginatedRequestParam>, _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, McpError> {
        Ok(ListToolsResult { meta: None, tools: self.tool_router.list_all(), next_cursor: None })
    }

    async fn call_tool(
        &self, request: CallToolRequestParam, context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, McpError> {
        self.tool_router
            .call(ToolCallContext::new(self, request, context))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::test_support::controller;

    #[tokio::test]
    async fn test_lists_every_tool() {
        let (controller, _network) = controller().await;
        let server = FolioServer::new(controller);

        let mut names: Vec<String> = server
            .tool_router
            .list_all()
            .into_iter()
            .map(|t| t.name.to_string())
            .collect();
        names.sort();

        assert_eq!(
            names,
            vec![
                "cache_delete",
                "cache_entries",
                "cache_keys",
                "cache_match",
                "sw_activate",
                "sw_fetch",
                "sw_install",
                "sw_status"
            ]
        );
    }

    #[tokio::test]
    async fn test_server_info() {
        let (controller, _network) = controller().await;

        let info = FolioServer::new(controller).get_info();

        assert_eq!(info.server_info.name, "folio-sw");
        assert!(info.capabilities.tools.is_some());
    }
}
