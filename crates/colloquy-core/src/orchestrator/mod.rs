//! Turn orchestration
//!
//! Ties the gateway, the tool registry and the session store together into
//! the model/tool loop. The orchestrator owns retry policy and the per-turn
//! round budget; tool failures stay inside the loop as data, and only
//! budget exhaustion, session expiry or a spent gateway surface as errors.

mod engine;
mod error;

pub use engine::Orchestrator;
pub use error::TurnError;
