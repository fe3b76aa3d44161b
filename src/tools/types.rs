//! Tool descriptors and results.

use serde::Serialize;
use serde_json::{json, Map, Value};

// ─── Argument Schema ────────────────────────────────────────────────────────

/// Type of a tool argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgKind {
    String,
    Integer,
}

impl ArgKind {
    /// JSON Schema type name.
    pub fn schema_type(self) -> &'static str {
        match self {
            ArgKind::String => "string",
            ArgKind::Integer => "integer",
        }
    }
}

/// One declared argument of a tool.
#[derive(Debug, Clone, PartialEq)]
pub struct ArgSpec {
    pub name: String,
    pub kind: ArgKind,
    pub required: bool,
    pub default: Option<Value>,
    pub description: String,
}

impl ArgSpec {
    /// A required argument.
    pub fn required(name: &str, kind: ArgKind, description: &str) -> Self {
        Self {
            name: name.to_string(),
            kind,
            required: true,
            default: None,
            description: description.to_string(),
        }
    }

    /// An optional argument with no default.
    pub fn optional(name: &str, kind: ArgKind, description: &str) -> Self {
        Self {
            required: false,
            ..Self::required(name, kind, description)
        }
    }

    /// Attach a default value (implies optional).
    pub fn with_default(mut self, default: Value) -> Self {
        self.required = false;
        self.default = Some(default);
        self
    }
}

// ─── ToolDescriptor ─────────────────────────────────────────────────────────

/// Name, description, and ordered argument schema of a tool.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolDescriptor {
    pub name: String,
    pub description: String,
    pub args: Vec<ArgSpec>,
}

impl ToolDescriptor {
    pub fn new(name: &str, description: &str) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            args: Vec::new(),
        }
    }

    /// Append an argument (builder style).
    pub fn arg(mut self, spec: ArgSpec) -> Self {
        self.args.push(spec);
        self
    }

    /// JSON Schema describing the arguments object.
    pub fn input_schema(&self) -> Value {
        let mut properties = Map::new();
        for spec in &self.args {
            let mut prop = json!({
                "type": spec.kind.schema_type(),
                "description": spec.description,
            });
            if let Some(default) = &spec.default {
                prop["default"] = default.clone();
            }
            properties.insert(spec.name.clone(), prop);
        }

        let required: Vec<&str> = self
            .args
            .iter()
            .filter(|spec| spec.required)
            .map(|spec| spec.name.as_str())
            .collect();

        json!({
            "type": "object",
            "properties": properties,
            "required": required,
        })
    }

    /// Entry for an MCP `tools/list` response.
    pub fn to_wire(&self) -> Value {
        json!({
            "name": self.name,
            "description": self.description,
            "inputSchema": self.input_schema(),
        })
    }
}

// ─── ToolResult ─────────────────────────────────────────────────────────────

/// Result of one tool call: a field map or an error message, never both.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolResult {
    Success(Map<String, Value>),
    Failure { message: String },
}

impl ToolResult {
    pub fn failure(message: impl Into<String>) -> Self {
        ToolResult::Failure {
            message: message.into(),
        }
    }

    /// Build a success result from any struct serializing to a JSON object.
    pub fn from_serialize<T: Serialize>(value: &T) -> Self {
        match serde_json::to_value(value) {
            Ok(Value::Object(map)) => ToolResult::Success(map),
            Ok(other) => {
                let mut map = Map::new();
                map.insert("result".into(), other);
                ToolResult::Success(map)
            }
            Err(e) => ToolResult::failure(format!("failed to serialize result: {e}")),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ToolResult::Success(_))
    }

    /// MCP `tools/call` result payload.
    ///
    /// Success maps are rendered as pretty JSON text content and also attached
    /// as `structuredContent`; failures become a text message with `isError`.
    pub fn to_call_result(&self) -> Value {
        match self {
            ToolResult::Success(map) => {
                let text = serde_json::to_string_pretty(map).unwrap_or_else(|_| "{}".to_string());
                json!({
                    "content": [{ "type": "text", "text": text }],
                    "structuredContent": map,
                    "isError": false,
                })
            }
            ToolResult::Failure { message } => json!({
                "content": [{ "type": "text", "text": message }],
                "isError": true,
            }),
        }
    }
}

impl From<super::errors::ToolError> for ToolResult {
    fn from(e: super::errors::ToolError) -> Self {
        ToolResult::failure(e.to_string())
    }
}

// ─── Tests ──────────────────────────────────────────────────────────────────
