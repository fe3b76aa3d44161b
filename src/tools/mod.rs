//! Tools: the named operations a session can call.
//!
//! This module handles:
//! - Tool descriptors and their JSON-Schema rendering
//! - Binding raw JSON arguments against a descriptor
//! - The registry that dispatches calls by name
//! - The `wireshark_*` handlers and the prompt store they serve

pub mod args;
pub mod errors;
pub mod handlers;
pub mod prompts;
pub mod registry;
pub mod types;

pub use args::ToolArgs;
pub use errors::ToolError;
pub use handlers::{build_registry, ToolContext};
pub use prompts::PromptStore;
pub use registry::{FnHandler, ToolHandler, ToolRegistry};
pub use types::{ArgKind, ArgSpec, ToolDescriptor, ToolResult};
