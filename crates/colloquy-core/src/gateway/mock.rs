//! Scripted gateway for tests
//!
//! Replies are queued ahead of time and popped in order, one per
//! [`complete`](LlmGateway::complete) call. Every call is also recorded so
//! tests can assert on the exact history and tool declarations the
//! orchestrator sent.

use std::collections::VecDeque;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::types::{Message, ToolCallRequest, ToolDeclaration};

use super::error::{GatewayError, GatewayResult};
use super::traits::{GatewayReply, LlmGateway};

/// One recorded [`complete`](LlmGateway::complete) invocation
#[derive(Debug, Clone)]
pub struct RecordedCall {
    /// History snapshot the caller passed in
    pub history: Vec<Message>,
    /// Tool declarations the caller passed in
    pub tools: Vec<ToolDeclaration>,
}

/// Gateway that replays a queued script instead of calling a model
///
/// Panics inside `complete` if the script runs dry, so a test that issues
/// more calls than it queued replies for fails loudly.
#[derive(Default)]
pub struct MockGateway {
    script: Mutex<VecDeque<GatewayResult<GatewayReply>>>,
    calls: Mutex<Vec<RecordedCall>>,
    delay: Option<Duration>,
}

impl MockGateway {
    /// Create a mock with an empty script
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mock that sleeps before answering each call
    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::default()
        }
    }

    /// Queue a plain text reply
    pub fn queue_text(&self, text: impl Into<String>) {
        self.queue_reply(GatewayReply::Text(text.into()));
    }

    /// Queue a tool-call reply
    pub fn queue_tool_calls(&self, calls: Vec<ToolCallRequest>) {
        self.queue_reply(GatewayReply::ToolCalls(calls));
    }

    /// Queue an arbitrary reply
    pub fn queue_reply(&self, reply: GatewayReply) {
        self.script.lock().push_back(Ok(reply));
    }

    /// Queue an error outcome
    pub fn queue_error(&self, error: GatewayError) {
        self.script.lock().push_back(Err(error));
    }

    /// All calls recorded so far
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().clone()
    }

    /// Number of calls recorded so far
    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }
}

#[async_trait]
impl LlmGateway for MockGateway {
    fn name(&self) -> &str {
        "mock"
    }

    async fn complete(
        &self,
        history: &[Message],
        tools: &[ToolDeclaration],
    ) -> GatewayResult<GatewayReply> {
        let call_number = {
            let mut calls = self.calls.lock();
            calls.push(RecordedCall {
                history: history.to_vec(),
                tools: tools.to_vec(),
            });
            calls.len()
        };

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        match self.script.lock().pop_front() {
            Some(reply) => reply,
            None => panic!("MockGateway script exhausted after {call_number} calls"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_replies_pop_in_order() {
        let mock = MockGateway::new();
        mock.queue_text("first");
        mock.queue_tool_calls(vec![ToolCallRequest::new(
            "call_1",
            "weather_tool",
            json!({"location": "Nairobi"}),
        )]);

        let first = mock.complete(&[Message::user("hi")], &[]).await.unwrap();
        assert_eq!(first, GatewayReply::Text("first".to_string()));

        let second = mock.complete(&[Message::user("hi")], &[]).await.unwrap();
        assert!(matches!(second, GatewayReply::ToolCalls(calls) if calls.len() == 1));
    }

    #[tokio::test]
    async fn test_records_history_and_tools() {
        let mock = MockGateway::new();
        mock.queue_text("ok");

        let history = vec![Message::system("rules"), Message::user("hello")];
        mock.complete(&history, &[]).await.unwrap();

        assert_eq!(mock.call_count(), 1);
        let recorded = mock.calls();
        assert_eq!(recorded[0].history.len(), 2);
        assert_eq!(recorded[0].history[1].content, "hello");
        assert!(recorded[0].tools.is_empty());
    }

    #[tokio::test]
    async fn test_queued_error_surfaces() {
        let mock = MockGateway::new();
        mock.queue_error(GatewayError::rate_limited("mock", "busy"));

        let err = mock.complete(&[], &[]).await.unwrap_err();
        assert!(err.is_retryable());
    }

    #[tokio::test]
    #[should_panic(expected = "script exhausted")]
    async fn test_exhausted_script_panics() {
        let mock = MockGateway::new();
        let _ = mock.complete(&[], &[]).await;
    }
}
