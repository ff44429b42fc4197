//! Tool declaration, call-request and result types

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::schema::InputSchema;

/// A registered tool as advertised to the model
///
/// The name is unique across the registry; the description is what the model
/// reads when deciding whether to call the tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDeclaration {
    /// Tool name (function name)
    pub name: String,
    /// Description of what the tool does
    pub description: String,
    /// Declared input fields, validated before every invocation
    pub schema: InputSchema,
}

impl ToolDeclaration {
    /// Create a new tool declaration
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        schema: InputSchema,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            schema,
        }
    }
}

/// A single tool invocation requested by the model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCallRequest {
    /// Correlation id, echoed back on the matching result
    pub id: String,
    /// Name of the tool being called
    pub name: String,
    /// Arguments payload, validated against the declared schema
    pub arguments: Value,
}

impl ToolCallRequest {
    /// Create a new tool call request
    pub fn new(id: impl Into<String>, name: impl Into<String>, arguments: Value) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            arguments,
        }
    }

    /// Get an argument by key
    pub fn get_arg(&self, key: &str) -> Option<&Value> {
        self.arguments.get(key)
    }

    /// Get an argument as a string
    pub fn get_arg_str(&self, key: &str) -> Option<&str> {
        self.arguments.get(key).and_then(|v| v.as_str())
    }

    /// Get an argument as an i64
    pub fn get_arg_i64(&self, key: &str) -> Option<i64> {
        self.arguments.get(key).and_then(|v| v.as_i64())
    }
}

/// Outcome of one tool invocation, ready to fold into a tool-role message
///
/// Failures are carried as data rather than errors so the model can see what
/// went wrong and react; `is_error` distinguishes the two cases.
#[derive(Debug, Clone)]
pub struct ToolResult {
    /// ID of the tool call this is responding to
    pub call_id: String,
    /// Name of the tool that was invoked
    pub tool_name: String,
    /// Serialized result payload, or a structured error description
    pub content: String,
    /// Whether this result represents a failure
    pub is_error: bool,
}

impl ToolResult {
    /// Create a successful tool result
    pub fn success(
        call_id: impl Into<String>,
        tool_name: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            call_id: call_id.into(),
            tool_name: tool_name.into(),
            content: content.into(),
            is_error: false,
        }
    }

    /// Create an error tool result
    pub fn error(
        call_id: impl Into<String>,
        tool_name: impl Into<String>,
        error: impl Into<String>,
    ) -> Self {
        Self {
            call_id: call_id.into(),
            tool_name: tool_name.into(),
            content: error.into(),
            is_error: true,
        }
    }
}
