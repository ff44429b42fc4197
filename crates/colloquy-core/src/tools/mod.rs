//! Tool registration and invocation
//!
//! This module owns the path from a model-requested tool call to the
//! tool-role message recording its outcome:
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │  ToolRegistry                                │
//! │                                              │
//! │  - registers declarations at startup         │
//! │  - validates arguments against the schema    │
//! │  - bounds each invocation with a timeout     │
//! │  - folds failures into error results         │
//! └──────────────────────────────────────────────┘
//!           │
//!           │ call(arguments) -> Result<Value, _>
//!           ▼
//! ┌──────────────────────────────────────────────┐
//! │  ToolHandler implementations                 │
//! │  (weather lookup, news search, ...)          │
//! └──────────────────────────────────────────────┘
//! ```

mod error;
mod handler;
mod registry;

pub use error::{BoxError, ToolError};
pub use handler::ToolHandler;
pub use registry::ToolRegistry;
