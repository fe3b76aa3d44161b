//! Argument binding: checks a raw JSON arguments object against a
//! [`ToolDescriptor`] and produces typed accessors.
//!
//! Rules:
//! - `null` or a missing arguments object counts as `{}`
//! - a required argument that is absent or `null` is an error
//! - a value of the wrong type is an error naming the argument
//! - integer arguments accept integral JSON numbers and digit strings
//! - defaults are filled in; undeclared arguments are ignored

use std::collections::HashMap;

use serde_json::Value;

use super::errors::ToolError;
use super::types::{ArgKind, ToolDescriptor};

/// A bound argument value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArgValue {
    String(String),
    Integer(i64),
}

/// Validated arguments for one tool call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolArgs {
    tool: String,
    values: HashMap<String, ArgValue>,
}

impl ToolArgs {
    /// Bind `raw` against `descriptor`.
    pub fn bind(descriptor: &ToolDescriptor, raw: &Value) -> Result<Self, ToolError> {
        let empty = serde_json::Map::new();
        let obj = match raw {
            Value::Null => &empty,
            Value::Object(obj) => obj,
            other => {
                return Err(invalid(
                    &descriptor.name,
                    format!("arguments must be an object, got {}", type_name(other)),
                ))
            }
        };

        let mut values = HashMap::new();

        for spec in &descriptor.args {
            let supplied = obj.get(&spec.name).filter(|v| !v.is_null());
            let value = match (supplied, &spec.default) {
                (Some(v), _) => v,
                (None, Some(default)) => default,
                (None, None) if spec.required => {
                    return Err(invalid(
                        &descriptor.name,
                        format!("missing required argument: '{}'", spec.name),
                    ));
                }
                (None, None) => continue,
            };

            let bound = coerce(spec.kind, value).ok_or_else(|| {
                invalid(
                    &descriptor.name,
                    format!(
                        "argument '{}' must be {}, got {}",
                        spec.name,
                        spec.kind.schema_type(),
                        type_name(value)
                    ),
                )
            })?;
            values.insert(spec.name.clone(), bound);
        }

        Ok(Self {
            tool: descriptor.name.clone(),
            values,
        })
    }

    /// Name of the tool these arguments were bound for.
    pub fn tool(&self) -> &str {
        &self.tool
    }

    /// String argument, if present.
    pub fn str(&self, name: &str) -> Option<&str> {
        match self.values.get(name) {
            Some(ArgValue::String(s)) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Integer argument, if present.
    pub fn int(&self, name: &str) -> Option<i64> {
        match self.values.get(name) {
            Some(ArgValue::Integer(i)) => Some(*i),
            _ => None,
        }
    }

    /// String argument that must be present (declared required).
    pub fn require_str(&self, name: &str) -> Result<&str, ToolError> {
        self.str(name)
            .ok_or_else(|| invalid(&self.tool, format!("missing required argument: '{name}'")))
    }

    /// Integer argument that must be strictly positive.
    pub fn positive_int(&self, name: &str) -> Result<u64, ToolError> {
        match self.int(name) {
            Some(v) if v > 0 => Ok(v as u64),
            Some(v) => Err(invalid(
                &self.tool,
                format!("argument '{name}' must be a positive integer, got {v}"),
            )),
            None => Err(invalid(&self.tool, format!("missing required argument: '{name}'"))),
        }
    }

    /// Integer argument that must not be negative.
    pub fn non_negative_int(&self, name: &str) -> Result<u64, ToolError> {
        match self.int(name) {
            Some(v) if v >= 0 => Ok(v as u64),
            Some(v) => Err(invalid(
                &self.tool,
                format!("argument '{name}' must not be negative, got {v}"),
            )),
            None => Err(invalid(&self.tool, format!("missing required argument: '{name}'"))),
        }
    }
}

fn coerce(kind: ArgKind, value: &Value) -> Option<ArgValue> {
    match (kind, value) {
        (ArgKind::String, Value::String(s)) => Some(ArgValue::String(s.clone())),
        (ArgKind::Integer, Value::Number(n)) => {
            if let Some(i) = n.as_i64() {
                return Some(ArgValue::Integer(i));
            }
            // Accept 5.0 but not 5.5
            n.as_f64()
                .filter(|f| f.fract() == 0.0 && f.abs() < i64::MAX as f64)
                .map(|f| ArgValue::Integer(f as i64))
        }
        (ArgKind::Integer, Value::String(s)) => s.trim().parse::<i64>().ok().map(ArgValue::Integer),
        _ => None,
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn invalid(tool: &str, reason: String) -> ToolError {
    ToolError::InvalidArguments {
        tool: tool.to_string(),
        reason,
    }
}

// ─── Tests ──────────────────────────────────────────────────────────────────
