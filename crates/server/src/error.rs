//! Structured errors for tool-level failures.
//!
//! Controller and cache failures arrive as `folio_core::Error` and carry
//! their own codes; these cover what the tool layer itself rejects.

use rmcp::model::{ErrorCode, ErrorData as McpError};

/// Structured errors for the folio-sw tool layer.
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    /// Invalid input parameters (e.g., an empty URL).
    #[error("INVALID_INPUT: {0}")]
    InvalidInput(String),

    /// Tool output could not be serialized.
    #[error("OUTPUT_FAILED: {0}")]
    OutputFailed(String),
}

impl From<ToolError> for McpError {
    fn from(err: ToolError) -> Self {
        let code = match &err {
            ToolError::InvalidInput(_) => -32602,
            ToolError::OutputFailed(_) => -32603,
        };

        McpError { code: ErrorCode(code), message: err.to_string().into(), data: None }
    }
}
