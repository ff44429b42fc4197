//! Colloquy Core
//!
//! Function-calling chat orchestration: per-session conversation history, a
//! schema-validated tool registry, an LLM gateway abstraction and the turn
//! loop that ties them together.
//!
//! ## The turn loop
//!
//! A turn takes one user input and drives the model until it produces a
//! final text answer. When the model requests tool calls instead, the
//! orchestrator executes the round concurrently, folds every outcome back
//! into the history as tool messages and asks the model again, up to a
//! configured round budget.
//!
//! ```rust,ignore
//! use colloquy_core::config::{OrchestratorConfig, SessionConfig};
//! use colloquy_core::gateway::{AzureConfig, AzureOpenAiGateway};
//! use colloquy_core::orchestrator::Orchestrator;
//! use colloquy_core::session::SessionStore;
//! use colloquy_core::tools::ToolRegistry;
//!
//! let gateway = AzureOpenAiGateway::new(AzureConfig::new(
//!     endpoint, api_key, api_version, deployment,
//! ))?;
//!
//! let registry = ToolRegistry::new();
//! registry.register(weather_declaration(), weather_handler)?;
//!
//! let orchestrator = Orchestrator::new(
//!     Arc::new(gateway),
//!     Arc::new(registry),
//!     Arc::new(SessionStore::new(SessionConfig::default())),
//!     OrchestratorConfig::default(),
//! );
//!
//! let answer = orchestrator.run_turn("session-1", "weather in Nairobi?").await?;
//! ```

pub mod config;
pub mod gateway;
pub mod orchestrator;
pub mod session;
pub mod tools;
pub mod types;

// Re-export commonly used types
pub use types::{
    Message, MessageRole,
    FieldSpec, FieldType, InputSchema, SchemaViolation, ValidationMode,
    ToolCallRequest, ToolDeclaration, ToolResult,
};

pub use config::{OrchestratorConfig, SessionConfig, DEFAULT_SYSTEM_PROMPT};

pub use gateway::{
    AzureConfig, AzureOpenAiGateway, GatewayError, GatewayReply, GatewayResult, LlmGateway,
    MockGateway,
};

pub use session::{Session, SessionError, SessionStore};

pub use tools::{BoxError, ToolError, ToolHandler, ToolRegistry};

pub use orchestrator::{Orchestrator, TurnError};
