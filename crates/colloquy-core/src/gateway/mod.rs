//! LLM gateway abstraction and implementations
//!
//! A gateway turns a conversation history plus the registered tool
//! declarations into one model reply: either finished text or a batch of
//! tool-call requests. Gateways never retry and never touch session state;
//! retry policy and history writes belong to the orchestrator.
//!
//! Two implementations ship here:
//! - `AzureOpenAiGateway` speaks the Azure OpenAI chat-completions protocol
//! - `MockGateway` replays a queued script for tests

mod azure;
mod error;
mod mock;
mod traits;

// Core trait and reply type
pub use traits::{GatewayReply, LlmGateway};
pub use error::{GatewayError, GatewayResult};

// Azure OpenAI implementation
pub use azure::{AzureConfig, AzureOpenAiGateway};

// Scripted gateway for testing
pub use mock::{MockGateway, RecordedCall};
