//! Server bootstrap

use std::net::SocketAddr;
use std::sync::Arc;

use colloquy_core::orchestrator::Orchestrator;
use colloquy_core::session::SessionStore;

use crate::routes::create_router;

/// Serve the chat API until the process is stopped
///
/// Starts the session sweeper alongside the listener; the caller is expected
/// to have initialized tracing already.
pub async fn run_server(
    orchestrator: Arc<Orchestrator>,
    store: Arc<SessionStore>,
    host: &str,
    port: u16,
) -> anyhow::Result<()> {
    let _sweeper = store.spawn_sweeper();

    let app = create_router(orchestrator);

    let addr = format!("{}:{}", host, port).parse::<SocketAddr>()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("listening on http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
