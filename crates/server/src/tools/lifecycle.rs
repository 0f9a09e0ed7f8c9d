//! sw_install, sw_activate and sw_status tool implementations.

use folio_worker::{Controller, Event, Outcome, WorkerState};
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::json_result;
use crate::error::ToolError;

/// Output from the sw_install tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct InstallOutput {
    /// Bucket the manifest was written to.
    pub cache_name: String,
    /// Number of entries in the bucket after install.
    pub cached: u64,
    /// Whether the new version may activate without waiting.
    pub skip_waiting: bool,
    pub state: WorkerState,
}

/// Output from the sw_activate tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ActivateOutput {
    pub cache_name: String,
    /// Stale buckets that were deleted.
    pub deleted: Vec<String>,
    /// Whether open pages should be taken over without a reload.
    pub claim_clients: bool,
    pub state: WorkerState,
}

/// Output from the sw_status tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct StatusOutput {
    pub state: WorkerState,
    pub origin: String,
    pub cache_name: String,
    pub offline_page: String,
    pub core_assets: Vec<String>,
    /// Every bucket currently in cache storage.
    pub buckets: Vec<String>,
}

fn unexpected(outcome: &Outcome) -> McpError {
    ToolError::OutputFailed(format!("unexpected outcome: {outcome:?}")).into()
}

/// Implementation of the sw_install tool.
pub async fn install_impl(controller: &Controller) -> Result<CallToolResult, McpError> {
    match controller.dispatch(Event::Install).await? {
        Outcome::Installed { cache_name, cached, skip_waiting } => {
            json_result(&InstallOutput { cache_name, cached, skip_waiting, state: controller.state().await })
        }
        other => Err(unexpected(&other)),
    }
}

/// Implementation of the sw_activate tool.
pub async fn activate_impl(controller: &Controller) -> Result<CallToolResult, McpError> {
    match controller.dispatch(Event::Activate).await? {
        Outcome::Activated { cache_name, deleted, claim_clients } => {
            json_result(&ActivateOutput { cache_name, deleted, claim_clients, state: controller.state().await })
        }
        other => Err(unexpected(&other)),
    }
}

/// Implementation of the sw_status tool.
pub async fn status_impl(controller: &Controller) -> Result<CallToolResult, McpError> {
    let scope = controller.scope();
    let output = StatusOutput {
        state: controller.state().await,
        origin: scope.origin().origin().ascii_serialization(),
        cache_name: scope.cache_name().to_string(),
        offline_page: scope.offline_page().to_string(),
        core_assets: scope.manifest().iter().map(|(path, _)| path.clone()).collect(),
        buckets: controller.cache().bucket_names().await?,
    };

    json_result(&output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::test_support::{controller, parse};
    use folio_core::Response;
    use folio_worker::testing::{page, scope};

    #[tokio::test]
    async fn test_install_then_activate() {
        let (controller, _network) = controller().await;
        controller.cache().open_bucket("gm-campbell-v4").await.unwrap();

        let installed: InstallOutput = parse(&install_impl(&controller).await.unwrap());
        assert_eq!(installed.cache_name, "gm-campbell-v5");
        assert_eq!(installed.cached, 6);
        assert!(installed.skip_waiting);
        assert_eq!(installed.state, WorkerState::Installed);

        let activated: ActivateOutput = parse(&activate_impl(&controller).await.unwrap());
        assert_eq!(activated.deleted, vec!["gm-campbell-v4"]);
        assert!(activated.claim_clients);
        assert_eq!(activated.state, WorkerState::Activated);
    }

    #[tokio::test]
    async fn test_install_failure_maps_to_error() {
        let (controller, network) = controller().await;
        network.serve(&page(&scope(), "/manifest.json"), Response::new(503, "unavailable"));

        let err = install_impl(&controller).await.unwrap_err();

        assert_eq!(err.code.0, -32005);
        assert!(err.message.contains("/manifest.json"));
    }

    #[tokio::test]
    async fn test_activate_twice_is_invalid_state() {
        let (controller, _network) = controller().await;
        install_impl(&controller).await.unwrap();
        activate_impl(&controller).await.unwrap();

        let err = activate_impl(&controller).await.unwrap_err();

        assert_eq!(err.code.0, -32004);
    }

    #[tokio::test]
    async fn test_status() {
        let (controller, _network) = controller().await;

        let status: StatusOutput = parse(&status_impl(&controller).await.unwrap());

        assert_eq!(status.state, WorkerState::Parsed);
        assert_eq!(status.origin, "https://portfolio.test");
        assert_eq!(status.offline_page, "/offline.html");
        assert!(status.buckets.is_empty());
        assert_eq!(status.core_assets.first().map(String::as_str), Some("/"));
    }
}
