//! Service configuration from the environment
//!
//! All settings come from environment variables (a `.env` file is loaded by
//! the binary before this runs). The Azure values are required and validated
//! up front so a misconfigured service refuses to start instead of failing on
//! the first chat request.

use colloquy_core::gateway::AzureConfig;
use thiserror::Error;

const DEFAULT_GEOCODE_URL: &str = "https://geocoding-api.open-meteo.com/v1/search";
const DEFAULT_FORECAST_URL: &str = "https://api.open-meteo.com/v1/forecast";
const DEFAULT_NEWSDATA_BASE: &str = "https://newsdata.io/api/1";

const REQUIRED_VARS: [&str; 4] = [
    "AZURE_OPENAI_ENDPOINT",
    "AZURE_OPENAI_API_KEY",
    "AZURE_OPENAI_API_VERSION",
    "AZURE_OPENAI_DEPLOYMENT",
];

/// Errors raised while reading configuration
#[derive(Debug, Error)]
pub enum SettingsError {
    /// One or more required variables are unset or blank
    #[error(
        "Missing required configuration values: {names}. \
         Set them in the environment or a .env file."
    )]
    MissingRequired { names: String },
}

impl SettingsError {
    fn missing_required(names: &[&str]) -> Self {
        SettingsError::MissingRequired {
            names: names.join(", "),
        }
    }
}

/// Resolved service configuration
#[derive(Debug, Clone)]
pub struct Settings {
    pub azure_endpoint: String,
    pub azure_api_key: String,
    pub azure_api_version: String,
    pub azure_deployment: String,
    pub open_meteo_geocode_url: String,
    pub open_meteo_forecast_url: String,
    pub newsdata_base_url: String,
    pub newsdata_api_key: Option<String>,
    pub host: String,
    pub port: u16,
}

impl Settings {
    /// Read settings from the process environment
    pub fn from_env() -> Result<Self, SettingsError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read settings through an arbitrary lookup; lets tests avoid touching
    /// the process environment
    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, SettingsError> {
        let value = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let missing: Vec<&str> = REQUIRED_VARS
            .iter()
            .copied()
            .filter(|name| value(name).is_none())
            .collect();
        if !missing.is_empty() {
            return Err(SettingsError::missing_required(&missing));
        }

        // every required name was checked present above
        let require = |name: &str| value(name).unwrap_or_default();

        Ok(Self {
            azure_endpoint: require("AZURE_OPENAI_ENDPOINT"),
            azure_api_key: require("AZURE_OPENAI_API_KEY"),
            azure_api_version: require("AZURE_OPENAI_API_VERSION"),
            azure_deployment: require("AZURE_OPENAI_DEPLOYMENT"),
            open_meteo_geocode_url: value("OPEN_METEO_GEOCODE_URL")
                .unwrap_or_else(|| DEFAULT_GEOCODE_URL.to_string()),
            open_meteo_forecast_url: value("OPEN_METEO_FORECAST_URL")
                .unwrap_or_else(|| DEFAULT_FORECAST_URL.to_string()),
            newsdata_base_url: value("NEWSDATA_BASE")
                .unwrap_or_else(|| DEFAULT_NEWSDATA_BASE.to_string()),
            newsdata_api_key: value("NEWSDATA_API_KEY"),
            host: value("HOST").unwrap_or_else(|| "127.0.0.1".to_string()),
            port: value("PORT")
                .and_then(|v| v.parse().ok())
                .unwrap_or(8000),
        })
    }

    /// Gateway connection settings for the configured Azure deployment
    pub fn azure_config(&self) -> AzureConfig {
        AzureConfig::new(
            self.azure_endpoint.clone(),
            self.azure_api_key.clone(),
            self.azure_api_version.clone(),
            self.azure_deployment.clone(),
        )
    }
}
