//! Bundled tools
//!
//! The service ships two capabilities the model can call: current weather
//! (Open-Meteo) and news search (newsdata.io). Both share one outbound HTTP
//! client so connection pools and timeouts are configured in a single place.

mod news;
mod weather;

pub use news::NewsTool;
pub use weather::WeatherTool;

use colloquy_core::tools::{ToolError, ToolRegistry};

use crate::settings::Settings;

/// Build the registry with the bundled weather and news tools
pub fn default_registry(
    settings: &Settings,
    client: reqwest::Client,
) -> Result<ToolRegistry, ToolError> {
    if settings.newsdata_api_key.is_none() {
        tracing::warn!("NEWSDATA_API_KEY is not set; news_tool will report failures");
    }

    let registry = ToolRegistry::new();
    registry.register(
        WeatherTool::declaration(),
        WeatherTool::new(
            client.clone(),
            settings.open_meteo_geocode_url.clone(),
            settings.open_meteo_forecast_url.clone(),
        ),
    )?;
    registry.register(
        NewsTool::declaration(),
        NewsTool::new(
            client,
            settings.newsdata_base_url.clone(),
            settings.newsdata_api_key.clone(),
        ),
    )?;
    Ok(registry)
}
