//! HTTP surface of the chat service

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use colloquy_core::orchestrator::Orchestrator;
use serde::{Deserialize, Serialize};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::error::Result;

pub type OrchestratorState = Arc<Orchestrator>;

/// POST /chat request body
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub input: String,
    /// Conversation to continue; omitted means the shared default session
    #[serde(default = "default_session")]
    pub session_id: String,
}

fn default_session() -> String {
    "default".to_string()
}

/// POST /chat response body
#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub output: String,
}

/// Create the application router with all endpoints
pub fn create_router(orchestrator: OrchestratorState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/chat", post(chat))
        .route("/healthz", get(healthz))
        .with_state(orchestrator)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

/// POST /chat
/// Runs one full turn and returns the final assistant text
async fn chat(
    State(orchestrator): State<OrchestratorState>,
    Json(req): Json<ChatRequest>,
) -> Result<impl IntoResponse> {
    let output = orchestrator.run_turn(&req.session_id, req.input).await?;
    Ok(Json(ChatResponse { output }))
}

/// GET /healthz
/// Liveness probe; answers with an empty 200
async fn healthz() -> StatusCode {
    StatusCode::OK
}
