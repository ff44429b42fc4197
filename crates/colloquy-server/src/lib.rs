//! Colloquy Server
//!
//! HTTP chat service over the colloquy orchestration core. Exposes one
//! conversational endpoint (`POST /chat`) and a liveness probe
//! (`GET /healthz`), wires the Azure OpenAI gateway to the bundled weather
//! and news tools, and keeps per-session history in memory.

pub mod error;
pub mod routes;
pub mod server;
pub mod settings;
pub mod tools;

pub use error::{ApiError, Result};
pub use routes::{create_router, ChatRequest, ChatResponse};
pub use server::run_server;
pub use settings::{Settings, SettingsError};
pub use tools::{default_registry, NewsTool, WeatherTool};
