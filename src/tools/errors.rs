//! Tool layer error types.

use thiserror::Error;

use crate::tshark::TsharkError;

/// Errors that can occur while registering or dispatching tools.
///
/// None of these ever reach the transport: dispatch turns each one into a
/// `ToolResult::Failure` so the caller's session stays open.
#[derive(Debug, Error)]
pub enum ToolError {
    /// Tool not found in the registry.
    #[error("unknown tool: '{name}'")]
    UnknownTool {
        name: String,
    },

    /// A tool with this name is already registered.
    #[error("tool already registered: '{name}'")]
    DuplicateTool {
        name: String,
    },

    /// Tool call arguments failed validation.
    #[error("invalid arguments for '{tool}': {reason}")]
    InvalidArguments {
        tool: String,
        reason: String,
    },

    /// Analysis type outside the fixed table.
    #[error("unsupported analysis type: '{name}'. Supported types: {}", supported.join(", "))]
    UnsupportedAnalysis {
        name: String,
        supported: Vec<String>,
    },

    /// Prompt id not present in the prompt store.
    #[error("no prompt with id '{id}'")]
    UnknownPrompt {
        id: String,
    },

    /// The external binary could not be run.
    #[error("execution failed: {0}")]
    Execution(TsharkError),
}

impl From<TsharkError> for ToolError {
    fn from(e: TsharkError) -> Self {
        match e {
            TsharkError::UnsupportedAnalysis { name, supported } => {
                ToolError::UnsupportedAnalysis { name, supported }
            }
            other => ToolError::Execution(other),
        }
    }
}
