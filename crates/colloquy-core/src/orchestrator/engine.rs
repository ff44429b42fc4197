//! The turn loop
//!
//! One turn runs user input to a final assistant answer:
//!
//! ```text
//!   append user input
//!        |
//!        v
//!   call model (with retry) <────────────┐
//!        |                               │
//!   text reply?  ── yes ──> append, done │
//!        |                               │
//!   tool calls: append announcement,     │
//!   execute round, append results ───────┘
//!            (until the round budget is spent)
//! ```
//!
//! Turns on the same session are strictly serialized by the session's turn
//! lock; turns on different sessions proceed in parallel.

use std::sync::Arc;

use crate::config::OrchestratorConfig;
use crate::gateway::{GatewayError, GatewayReply, LlmGateway};
use crate::session::SessionStore;
use crate::tools::ToolRegistry;
use crate::types::Message;

use super::error::TurnError;

/// Drives the model/tool loop for every session
pub struct Orchestrator {
    gateway: Arc<dyn LlmGateway>,
    registry: Arc<ToolRegistry>,
    store: Arc<SessionStore>,
    config: OrchestratorConfig,
}

impl Orchestrator {
    /// Assemble an orchestrator from its collaborators
    pub fn new(
        gateway: Arc<dyn LlmGateway>,
        registry: Arc<ToolRegistry>,
        store: Arc<SessionStore>,
        config: OrchestratorConfig,
    ) -> Self {
        Self {
            gateway,
            registry,
            store,
            config,
        }
    }

    /// Run one full turn and return the final assistant text
    ///
    /// The session is created on first use. Everything the turn produces,
    /// including tool announcements and tool results of a round that exhausts
    /// the budget, is recorded in the session history before this returns.
    #[tracing::instrument(skip(self, input), fields(session = %session_id, gateway = %self.gateway.name()))]
    pub async fn run_turn(
        &self,
        session_id: &str,
        input: impl Into<String>,
    ) -> Result<String, TurnError> {
        let turn_lock = self.store.get_or_create(session_id);
        let _guard = turn_lock.lock().await;

        self.store
            .append(session_id, &turn_lock, Message::user(input))?;

        let mut rounds: u32 = 0;
        loop {
            let history = self.store.history(session_id, &turn_lock)?;
            let reply = self.call_gateway_with_retry(&history).await?;

            match reply {
                GatewayReply::Text(text) => {
                    self.store
                        .append(session_id, &turn_lock, Message::assistant(&text))?;
                    tracing::debug!(rounds, "turn finished with final answer");
                    return Ok(text);
                }
                // an empty call list carries no work; treat it as empty text
                GatewayReply::ToolCalls(calls) if calls.is_empty() => {
                    self.store
                        .append(session_id, &turn_lock, Message::assistant(""))?;
                    tracing::debug!(rounds, "turn finished with empty reply");
                    return Ok(String::new());
                }
                GatewayReply::ToolCalls(calls) => {
                    tracing::debug!(rounds, requested = calls.len(), "executing tool round");
                    self.store
                        .append(session_id, &turn_lock, Message::tool_calls("", calls.clone()))?;

                    let results = self.registry.execute_calls(&calls).await;
                    let messages = results.into_iter().map(Message::from).collect();
                    self.store.append_all(session_id, &turn_lock, messages)?;

                    rounds += 1;
                    if rounds > self.config.turn_budget {
                        tracing::warn!(rounds, "turn exceeded its tool round budget");
                        return Err(TurnError::ToolLoopExceeded { rounds });
                    }
                }
            }
        }
    }

    /// Call the gateway, retrying transient failures with jittered backoff
    ///
    /// The configured system prompt is prepended to the outbound history only;
    /// it is never written to the session.
    async fn call_gateway_with_retry(
        &self,
        history: &[Message],
    ) -> Result<GatewayReply, TurnError> {
        let outbound = match &self.config.system_prompt {
            Some(prompt) => {
                let mut messages = Vec::with_capacity(history.len() + 1);
                messages.push(Message::system(prompt));
                messages.extend_from_slice(history);
                messages
            }
            None => history.to_vec(),
        };
        let declarations = self.registry.declarations();

        let mut attempt: u32 = 0;
        loop {
            attempt += 1;
            let outcome = match tokio::time::timeout(
                self.config.gateway_timeout,
                self.gateway.complete(&outbound, &declarations),
            )
            .await
            {
                Ok(result) => result,
                Err(_) => Err(GatewayError::timeout(self.config.gateway_timeout)),
            };

            match outcome {
                Ok(reply) => {
                    if attempt > 1 {
                        tracing::debug!(attempt, "model call succeeded after retry");
                    }
                    return Ok(reply);
                }
                Err(error) if error.is_retryable() && attempt < self.config.retry_attempts => {
                    let delay = self.retry_delay(attempt);
                    tracing::warn!(
                        attempt,
                        %error,
                        delay_ms = delay.as_millis() as u64,
                        "model call failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(error) => {
                    tracing::error!(attempt, %error, "model call failed");
                    return Err(TurnError::Gateway {
                        attempts: attempt,
                        source: error,
                    });
                }
            }
        }
    }

    /// Exponential backoff with jitter: doubles per attempt, capped, then
    /// scaled into the upper half of the window so retries do not align
    fn retry_delay(&self, attempt: u32) -> std::time::Duration {
        let shift = (attempt - 1).min(16);
        let capped = self
            .config
            .retry_base_delay
            .saturating_mul(1u32 << shift)
            .min(self.config.retry_max_delay);
        capped.mul_f64(0.5 + rand::random::<f64>() * 0.5)
    }
}
