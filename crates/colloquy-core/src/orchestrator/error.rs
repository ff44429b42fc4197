//! Turn-level error taxonomy

use thiserror::Error;

use crate::gateway::GatewayError;
use crate::session::SessionError;

/// Ways a whole turn can fail
///
/// Tool failures never appear here; they are folded into the history as
/// tool-role messages and the turn continues. A `TurnError` means the turn
/// produced no assistant answer.
#[derive(Error, Debug)]
pub enum TurnError {
    /// The model kept requesting tools past the per-turn round budget
    #[error("tool loop exceeded {rounds} rounds without a final answer")]
    ToolLoopExceeded { rounds: u32 },

    /// The session disappeared mid-turn, usually evicted by the sweeper
    #[error("session `{id}` expired")]
    SessionExpired { id: String },

    /// The gateway failed after every allowed attempt
    #[error("model call failed after {attempts} attempts")]
    Gateway {
        attempts: u32,
        #[source]
        source: GatewayError,
    },
}

impl TurnError {
    /// A short apologetic text suitable for showing to the end user
    ///
    /// Internal detail stays in the `Display`/`source` chain for logs; this
    /// is what the chat surface renders when the turn produced no answer.
    pub fn user_message(&self) -> &'static str {
        match self {
            TurnError::ToolLoopExceeded { .. } => {
                "Sorry, I could not finish working through that request. Please try rephrasing it."
            }
            TurnError::SessionExpired { .. } => {
                "Sorry, this conversation has expired. Please start a new one."
            }
            TurnError::Gateway { .. } => {
                "Sorry, I am having trouble reaching the model right now. Please try again shortly."
            }
        }
    }
}

impl From<SessionError> for TurnError {
    fn from(error: SessionError) -> Self {
        match error {
            SessionError::NotFound { id } => TurnError::SessionExpired { id },
        }
    }
}
