//! Gateway trait definition

use async_trait::async_trait;

use crate::types::{Message, ToolCallRequest, ToolDeclaration};

use super::error::GatewayResult;

/// Outcome of one model call: a final text, or tool calls to execute
///
/// Exactly these two shapes exist and the orchestrator matches them
/// exhaustively. A reply carrying an empty call list is legal; the
/// orchestrator treats it like an empty text reply.
#[derive(Debug, Clone, PartialEq)]
pub enum GatewayReply {
    /// The model answered with text; the turn can finish
    Text(String),
    /// The model wants tool invocations folded in before it answers
    ToolCalls(Vec<ToolCallRequest>),
}

/// Boundary to the model provider
///
/// `complete` sends the full conversation plus the tool catalogue and maps
/// the provider's envelope down to a [`GatewayReply`]. Implementations never
/// retry on their own; retry policy lives in the orchestrator.
#[async_trait]
pub trait LlmGateway: Send + Sync {
    /// Provider name used in logs and error messages
    fn name(&self) -> &str;

    /// One completion call over the full conversation
    async fn complete(
        &self,
        history: &[Message],
        tools: &[ToolDeclaration],
    ) -> GatewayResult<GatewayReply>;
}
