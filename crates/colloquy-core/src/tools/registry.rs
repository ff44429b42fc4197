//! Tool registry: declaration, validation and invocation
//!
//! The registry is the single map from tool name to capability:
//! - tools register once at startup; the set is immutable afterwards
//! - declarations go out with every model call, in registration order
//! - invocations are schema-validated and timeout-bounded, and their
//!   failures come back as data rather than aborting the round

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use parking_lot::RwLock;
use serde_json::Value;
use tokio::sync::oneshot;

use crate::types::{ToolCallRequest, ToolDeclaration, ToolResult, ValidationMode};

use super::error::ToolError;
use super::handler::ToolHandler;

struct ToolEntry {
    declaration: ToolDeclaration,
    handler: Arc<dyn ToolHandler>,
}

/// Registry of invocable tools
pub struct ToolRegistry {
    /// Registered tools, kept in registration order
    entries: RwLock<Vec<ToolEntry>>,
    /// How argument payloads are checked against declared schemas
    validation: ValidationMode,
    /// Upper bound on a single handler invocation
    timeout: Duration,
}

impl ToolRegistry {
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

    /// Create an empty registry with strict validation
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(Vec::new()),
            validation: ValidationMode::default(),
            timeout: Self::DEFAULT_TIMEOUT,
        }
    }

    /// Set how undeclared argument fields are treated
    pub fn with_validation_mode(mut self, mode: ValidationMode) -> Self {
        self.validation = mode;
        self
    }

    /// Set the per-invocation timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Register a tool under its declared name
    pub fn register(
        &self,
        declaration: ToolDeclaration,
        handler: impl ToolHandler + 'static,
    ) -> Result<(), ToolError> {
        let mut entries = self.entries.write();
        if entries.iter().any(|e| e.declaration.name == declaration.name) {
            return Err(ToolError::duplicate(&declaration.name));
        }
        tracing::debug!(tool = %declaration.name, "registered tool");
        entries.push(ToolEntry {
            declaration,
            handler: Arc::new(handler),
        });
        Ok(())
    }

    /// Declarations for every registered tool, in registration order
    pub fn declarations(&self) -> Vec<ToolDeclaration> {
        self.entries
            .read()
            .iter()
            .map(|e| e.declaration.clone())
            .collect()
    }

    /// Number of registered tools
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Whether any tools are registered
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Validate arguments against the declared schema and invoke the handler
    pub async fn invoke(&self, name: &str, arguments: Value) -> Result<Value, ToolError> {
        let (schema, handler) = {
            let entries = self.entries.read();
            let entry = entries
                .iter()
                .find(|e| e.declaration.name == name)
                .ok_or_else(|| ToolError::unknown(name))?;
            (entry.declaration.schema.clone(), entry.handler.clone())
        };

        schema
            .validate(&arguments, self.validation)
            .map_err(|violation| ToolError::SchemaValidation {
                name: name.to_string(),
                violation,
            })?;

        // The handler runs on its own task and delivers through a channel.
        // Timing out or abandoning the invocation drops the receiver without
        // cancelling side effects already in flight; the task then logs the
        // discarded outcome instead of delivering it.
        let (tx, rx) = oneshot::channel();
        let tool = name.to_string();
        tokio::spawn(async move {
            let outcome = handler.call(arguments).await;
            if let Err(undelivered) = tx.send(outcome) {
                match undelivered {
                    Ok(_) => tracing::warn!(
                        %tool,
                        "discarding tool result for an abandoned invocation"
                    ),
                    Err(error) => tracing::warn!(
                        %tool,
                        %error,
                        "discarding tool failure for an abandoned invocation"
                    ),
                }
            }
        });

        match tokio::time::timeout(self.timeout, rx).await {
            Ok(Ok(Ok(value))) => Ok(value),
            Ok(Ok(Err(source))) => Err(ToolError::execution(name, source)),
            // sender dropped without delivering: the handler panicked
            Ok(Err(_)) => Err(ToolError::execution(
                name,
                "tool handler panicked before returning".into(),
            )),
            Err(_) => Err(ToolError::timeout(name, self.timeout)),
        }
    }

    /// Invoke one requested call, folding any failure into an error result
    pub async fn execute_call(&self, request: &ToolCallRequest) -> ToolResult {
        match self.invoke(&request.name, request.arguments.clone()).await {
            Ok(value) => ToolResult::success(&request.id, &request.name, value.to_string()),
            Err(error) => {
                tracing::warn!(
                    tool = %request.name,
                    call_id = %request.id,
                    %error,
                    "tool invocation failed"
                );
                ToolResult::error(&request.id, &request.name, error_payload(&error))
            }
        }
    }

    /// Execute a round of requested calls concurrently
    ///
    /// Results come back in request order regardless of completion order.
    pub async fn execute_calls(&self, requests: &[ToolCallRequest]) -> Vec<ToolResult> {
        join_all(requests.iter().map(|r| self.execute_call(r))).await
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Structured error description handed back to the model as the tool result
fn error_payload(error: &ToolError) -> String {
    serde_json::json!({
        "error": error.kind(),
        "detail": error.to_string(),
    })
    .to_string()
}
