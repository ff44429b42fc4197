//! Conversation message types

use serde::{Deserialize, Serialize};

use super::tool::{ToolCallRequest, ToolResult};

/// Message role in a conversation
///
/// Session history only ever contains `User`, `Assistant` and `Tool`
/// messages; `System` exists for the instruction message prepended to the
/// wire conversation on each model call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
    Tool,
}

impl std::fmt::Display for MessageRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MessageRole::System => write!(f, "system"),
            MessageRole::User => write!(f, "user"),
            MessageRole::Assistant => write!(f, "assistant"),
            MessageRole::Tool => write!(f, "tool"),
        }
    }
}

/// One entry in a session's ordered history
///
/// Messages are immutable once appended; a session is only ever extended,
/// never reordered or rewritten. An assistant message that announces tool
/// calls carries the requested calls in `tool_calls` (its `content` may be
/// empty); a tool-role message carries the originating call id and tool name
/// alongside the serialized result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// The role of the message sender
    pub role: MessageRole,
    /// The textual content (possibly empty for a tool-call announcement)
    pub content: String,
    /// Tool calls announced by an assistant message
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCallRequest>,
    /// For tool-role messages: the call this result answers
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
    /// For tool-role messages: the tool that produced the result
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_name: Option<String>,
}

impl Message {
    /// Create a system message
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: content.into(),
            tool_calls: Vec::new(),
            tool_call_id: None,
            tool_name: None,
        }
    }

    /// Create a user message
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
            tool_calls: Vec::new(),
            tool_call_id: None,
            tool_name: None,
        }
    }

    /// Create an assistant message
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: content.into(),
            tool_calls: Vec::new(),
            tool_call_id: None,
            tool_name: None,
        }
    }

    /// Create an assistant message announcing a set of requested tool calls
    pub fn tool_calls(content: impl Into<String>, calls: Vec<ToolCallRequest>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: content.into(),
            tool_calls: calls,
            tool_call_id: None,
            tool_name: None,
        }
    }

    /// Create a tool-role message carrying one invocation result
    pub fn tool_result(
        call_id: impl Into<String>,
        tool_name: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            role: MessageRole::Tool,
            content: content.into(),
            tool_calls: Vec::new(),
            tool_call_id: Some(call_id.into()),
            tool_name: Some(tool_name.into()),
        }
    }

    /// Whether this assistant message announces tool calls
    pub fn announces_tool_calls(&self) -> bool {
        self.role == MessageRole::Assistant && !self.tool_calls.is_empty()
    }
}

impl From<ToolResult> for Message {
    fn from(result: ToolResult) -> Self {
        Message::tool_result(result.call_id, result.tool_name, result.content)
    }
}
