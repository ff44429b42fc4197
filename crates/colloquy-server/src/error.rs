//! HTTP error mapping
//!
//! Turn failures map onto statuses a client can act on, and the response
//! body carries only the user-facing text. The internal error chain goes to
//! the logs, never over the wire.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use colloquy_core::orchestrator::TurnError;
use serde_json::json;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ApiError>;

/// Errors a route handler can return
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Turn(#[from] TurnError),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::Turn(TurnError::SessionExpired { .. }) => StatusCode::GONE,
            ApiError::Turn(TurnError::ToolLoopExceeded { .. }) => StatusCode::CONFLICT,
            // a retryable source means the client can usefully try again
            ApiError::Turn(TurnError::Gateway { source, .. }) if source.is_retryable() => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            ApiError::Turn(TurnError::Gateway { .. }) => StatusCode::BAD_GATEWAY,
        }
    }

    fn user_message(&self) -> &'static str {
        match self {
            ApiError::Turn(err) => err.user_message(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        tracing::error!(error = ?self, %status, "request failed");
        (status, Json(json!({ "error": self.user_message() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use colloquy_core::gateway::GatewayError;

    #[test]
    fn test_turn_errors_map_to_statuses() {
        let gone: ApiError = TurnError::SessionExpired { id: "s".into() }.into();
        assert_eq!(gone.status(), StatusCode::GONE);

        let conflict: ApiError = TurnError::ToolLoopExceeded { rounds: 4 }.into();
        assert_eq!(conflict.status(), StatusCode::CONFLICT);

        let unavailable: ApiError = TurnError::Gateway {
            attempts: 3,
            source: GatewayError::rate_limited("azure-openai", "busy"),
        }
        .into();
        assert_eq!(unavailable.status(), StatusCode::SERVICE_UNAVAILABLE);

        let bad_gateway: ApiError = TurnError::Gateway {
            attempts: 1,
            source: GatewayError::auth("azure-openai", 401),
        }
        .into();
        assert_eq!(bad_gateway.status(), StatusCode::BAD_GATEWAY);
    }
}
