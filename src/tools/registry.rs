//! Tool registry: named tools with their schemas and handlers.
//!
//! Provides:
//! - Registration at startup (names are unique, order is preserved)
//! - Listing of descriptors for `tools/list`
//! - Dispatch by name with argument binding
//!
//! Dispatch never fails at the Rust level: unknown tools and bad arguments
//! come back as `ToolResult::Failure` so a session survives any call.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use serde_json::Value;

use super::args::ToolArgs;
use super::errors::ToolError;
use super::types::{ToolDescriptor, ToolResult};

// ─── Handler ────────────────────────────────────────────────────────────────

/// Executes one tool call with already-bound arguments.
#[async_trait]
pub trait ToolHandler: Send + Sync {
    async fn call(&self, args: ToolArgs) -> ToolResult;
}

/// Adapter turning an async closure into a [`ToolHandler`].
pub struct FnHandler<F>(pub F);

#[async_trait]
impl<F, Fut> ToolHandler for FnHandler<F>
where
    F: Fn(ToolArgs) -> Fut + Send + Sync,
    Fut: Future<Output = ToolResult> + Send,
{
    async fn call(&self, args: ToolArgs) -> ToolResult {
        (self.0)(args).await
    }
}

// ─── ToolRegistry ───────────────────────────────────────────────────────────

struct RegisteredTool {
    descriptor: ToolDescriptor,
    handler: Arc<dyn ToolHandler>,
}

/// Registry of tools, read-only once the server starts.
#[derive(Default)]
pub struct ToolRegistry {
    /// `tool_name → (descriptor, handler)`.
    tools: HashMap<String, RegisteredTool>,
    /// Registration order, used for listing.
    order: Vec<String>,
}

impl ToolRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool. Names must be unique.
    pub fn register(
        &mut self,
        descriptor: ToolDescriptor,
        handler: Arc<dyn ToolHandler>,
    ) -> Result<(), ToolError> {
        if self.tools.contains_key(&descriptor.name) {
            return Err(ToolError::DuplicateTool {
                name: descriptor.name,
            });
        }

        self.order.push(descriptor.name.clone());
        self.tools.insert(
            descriptor.name.clone(),
            RegisteredTool {
                descriptor,
                handler,
            },
        );
        Ok(())
    }

    /// Look up a descriptor by name.
    pub fn get(&self, name: &str) -> Option<&ToolDescriptor> {
        self.tools.get(name).map(|t| &t.descriptor)
    }

    /// All descriptors, in registration order.
    pub fn list(&self) -> Vec<&ToolDescriptor> {
        self.order
            .iter()
            .filter_map(|name| self.get(name))
            .collect()
    }

    /// Number of registered tools.
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Bind `arguments` and run the named tool.
    pub async fn dispatch(&self, name: &str, arguments: &Value) -> ToolResult {
        let Some(tool) = self.tools.get(name) else {
            tracing::warn!(tool = %name, "call to unknown tool");
            return ToolError::UnknownTool {
                name: name.to_string(),
            }
            .into();
        };

        let args = match ToolArgs::bind(&tool.descriptor, arguments) {
            Ok(args) => args,
            Err(e) => {
                tracing::info!(tool = %name, error = %e, "rejected tool arguments");
                return e.into();
            }
        };

        let start = Instant::now();
        let result = tool.handler.call(args).await;
        let elapsed_ms = start.elapsed().as_millis() as u64;

        match &result {
            ToolResult::Success(_) => {
                tracing::info!(tool = %name, elapsed_ms, "tool call succeeded")
            }
            ToolResult::Failure { message } => {
                tracing::warn!(tool = %name, elapsed_ms, error = %message, "tool call failed")
            }
        }

        result
    }
}

// ─── Tests ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::types::{ArgKind, ArgSpec};
    use serde_json::json;

    fn echo_handler() -> Arc<dyn ToolHandler> {
        Arc::new(FnHandler(|args: ToolArgs| async move {
            let mut map = serde_json::Map::new();
            map.insert("echo".into(), json!(args.str("text").unwrap_or_default()));
            ToolResult::Success(map)
        }))
    }

    fn echo_descriptor(name: &str) -> ToolDescriptor {
        ToolDescriptor::new(name, "Echo text back")
            .arg(ArgSpec::required("text", ArgKind::String, "Text to echo"))
    }

    #[test]
    fn test_register_then_list_once() {
        let mut registry = ToolRegistry::new();
        registry.register(echo_descriptor("echo"), echo_handler()).unwrap();

        let names: Vec<&str> = registry.list().iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names.iter().filter(|n| **n == "echo").count(), 1);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_duplicate_registration_rejected() {
        let mut registry = ToolRegistry::new();
        registry.register(echo_descriptor("echo"), echo_handler()).unwrap();
        let err = registry
            .register(echo_descriptor("echo"), echo_handler())
            .unwrap_err();
        assert!(matches!(err, ToolError::DuplicateTool { .. }));
        assert_eq!(registry.list().len(), 1);
    }

    #[test]
    fn test_list_keeps_registration_order() {
        let mut registry = ToolRegistry::new();
        for name in ["zeta", "alpha", "mid"] {
            registry.register(echo_descriptor(name), echo_handler()).unwrap();
        }
        let names: Vec<&str> = registry.list().iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["zeta", "alpha", "mid"]);
    }

    #[tokio::test]
    async fn test_dispatch_unknown_tool_is_failure() {
        let registry = ToolRegistry::new();
        for name in ["nope", "", "wireshark_delete_everything"] {
            match registry.dispatch(name, &json!({})).await {
                ToolResult::Failure { message } => {
                    assert!(message.contains(&format!("'{name}'")), "{message}");
                }
                other => panic!("expected failure, got {other:?}"),
            }
        }
    }

    #[tokio::test]
    async fn test_dispatch_binds_arguments() {
        let mut registry = ToolRegistry::new();
        registry.register(echo_descriptor("echo"), echo_handler()).unwrap();

        let result = registry
            .dispatch("echo", &json!({"text": "hi", "unused": true}))
            .await;
        match result {
            ToolResult::Success(map) => assert_eq!(map["echo"], "hi"),
            other => panic!("expected success, got {other:?}"),
        }

        let result = registry.dispatch("echo", &json!({})).await;
        assert!(!result.is_success());
    }
}
