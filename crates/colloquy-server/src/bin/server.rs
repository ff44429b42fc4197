use std::sync::Arc;
use std::time::Duration;

use colloquy_core::config::{OrchestratorConfig, SessionConfig};
use colloquy_core::gateway::AzureOpenAiGateway;
use colloquy_core::orchestrator::Orchestrator;
use colloquy_core::session::SessionStore;
use colloquy_server::{default_registry, run_server, Settings};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env values fill in anything the environment leaves unset
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "colloquy_server=debug,colloquy_core=debug,tower_http=debug".into()
            }),
        )
        .init();

    let settings = Settings::from_env()?;

    // one outbound client shared by every tool
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(10))
        .build()?;

    let registry = Arc::new(default_registry(&settings, client)?);
    let gateway = Arc::new(AzureOpenAiGateway::new(settings.azure_config())?);
    let store = Arc::new(SessionStore::new(SessionConfig::default()));

    tracing::info!(
        deployment = %settings.azure_deployment,
        tools = registry.len(),
        "starting chat service"
    );

    let orchestrator = Arc::new(Orchestrator::new(
        gateway,
        registry,
        Arc::clone(&store),
        OrchestratorConfig::default(),
    ));

    run_server(orchestrator, store, &settings.host, settings.port).await
}
