//! sw_fetch tool implementation.
//!
//! Dispatches one fetch event, as if a page of the site had issued the
//! request, and reports what the controller decided.

use std::collections::BTreeMap;

use folio_client::resolve;
use folio_core::Request;
use folio_worker::{Controller, Event, FetchOutcome, Outcome, ResponseSource};
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::{body_text, json_result};
use crate::error::ToolError;

/// Input parameters for sw_fetch tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SwFetchParams {
    /// URL to request. Paths resolve against the site origin.
    pub url: String,

    /// HTTP method (default: GET).
    #[serde(default = "default_method")]
    pub method: String,

    /// Optional Accept header.
    #[serde(default)]
    pub accept: Option<String>,

    /// Treat the request as a top-level navigation.
    #[serde(default)]
    pub navigate: bool,
}

fn default_method() -> String {
    "GET".into()
}

/// What the controller did with the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    /// Not intercepted; default network handling applies.
    Passthrough,
    Respond,
    /// Intercepted but nothing could answer; the page sees a network error.
    Unavailable,
}

/// Output structure for sw_fetch tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SwFetchOutput {
    /// The resolved request URL.
    pub url: String,
    pub method: String,
    pub decision: Decision,
    pub source: Option<ResponseSource>,
    pub status: Option<u16>,
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    /// Response body, when it is valid UTF-8.
    pub body: Option<String>,
    pub body_len: usize,
}

/// Implementation of the sw_fetch tool.
pub async fn fetch_impl(controller: &Controller, params: SwFetchParams) -> Result<CallToolResult, McpError> {
    if params.url.trim().is_empty() {
        return Err(ToolError::InvalidInput("url cannot be empty".into()).into());
    }
    if params.method.trim().is_empty() {
        return Err(ToolError::InvalidInput("method cannot be empty".into()).into());
    }

    let url = resolve(controller.scope().origin(), &params.url).map_err(|e| ToolError::InvalidInput(e.to_string()))?;
    let mut request = Request::new(params.method.trim(), url);
    if let Some(accept) = params.accept {
        request = request.with_header("Accept", accept);
    }
    if params.navigate {
        request = request.navigation();
    }

    let outcome = match controller.dispatch(Event::Fetch(request.clone())).await? {
        Outcome::Fetch(outcome) => outcome,
        other => return Err(ToolError::OutputFailed(format!("unexpected outcome: {other:?}")).into()),
    };

    let mut output = SwFetchOutput {
        url: request.url().to_string(),
        method: request.method().to_string(),
        decision: Decision::Passthrough,
        source: None,
        status: None,
        headers: BTreeMap::new(),
        body: None,
        body_len: 0,
    };

    match outcome {
        FetchOutcome::Passthrough => {}
        FetchOutcome::Unavailable => output.decision = Decision::Unavailable,
        FetchOutcome::Respond { response, source } => {
            output.decision = Decision::Respond;
            output.source = Some(source);
            output.status = Some(response.status);
            output.body = body_text(&response);
            output.body_len = response.body.len();
            output.headers = response.headers;
        }
    }

    json_result(&output)
}
