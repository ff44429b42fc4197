//! Tool registration and invocation errors

use std::time::Duration;

use thiserror::Error;

use crate::types::SchemaViolation;

/// Boxed error type tool handlers return on failure
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors raised while registering or invoking tools
///
/// Invocation errors are never propagated past the round that produced them;
/// the registry folds them into error results the model can read.
#[derive(Debug, Error)]
pub enum ToolError {
    /// A tool with this name is already registered
    #[error("tool `{name}` is already registered")]
    Duplicate { name: String },

    /// No tool with this name is registered
    #[error("unknown tool `{name}`")]
    Unknown { name: String },

    /// Arguments did not conform to the declared input schema
    #[error("invalid arguments for tool `{name}`: {violation}")]
    SchemaValidation {
        name: String,
        violation: SchemaViolation,
    },

    /// The handler itself returned a failure
    #[error("tool `{name}` failed: {source}")]
    Execution {
        name: String,
        #[source]
        source: BoxError,
    },

    /// The handler did not complete within the configured timeout
    #[error("tool `{name}` timed out after {timeout:?}")]
    Timeout { name: String, timeout: Duration },
}

impl ToolError {
    /// Create a duplicate-registration error
    pub fn duplicate(name: impl Into<String>) -> Self {
        ToolError::Duplicate { name: name.into() }
    }

    /// Create an unknown-tool error
    pub fn unknown(name: impl Into<String>) -> Self {
        ToolError::Unknown { name: name.into() }
    }

    /// Wrap a handler failure
    pub fn execution(name: impl Into<String>, source: BoxError) -> Self {
        ToolError::Execution {
            name: name.into(),
            source,
        }
    }

    /// Create a timeout error
    pub fn timeout(name: impl Into<String>, timeout: Duration) -> Self {
        ToolError::Timeout {
            name: name.into(),
            timeout,
        }
    }

    /// Stable tag identifying the error class in structured payloads
    pub fn kind(&self) -> &'static str {
        match self {
            ToolError::Duplicate { .. } => "duplicate_tool",
            ToolError::Unknown { .. } => "unknown_tool",
            ToolError::SchemaValidation { .. } => "schema_validation",
            ToolError::Execution { .. } => "execution_error",
            ToolError::Timeout { .. } => "timeout",
        }
    }
}
