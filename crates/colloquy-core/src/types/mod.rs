//! Core types for the orchestration loop
//!
//! This module contains the shared data model: messages, tool declarations
//! and the schema language tool arguments are validated against.

mod message;
mod schema;
mod tool;

pub use message::{Message, MessageRole};
pub use schema::{FieldSpec, FieldType, InputSchema, SchemaViolation, ValidationMode};
pub use tool::{ToolCallRequest, ToolDeclaration, ToolResult};
