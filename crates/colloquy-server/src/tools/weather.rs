//! Current-weather tool backed by Open-Meteo
//!
//! Resolves a free-form location through the geocoding API, then reads
//! current conditions from the forecast API. Neither endpoint needs
//! credentials.

use async_trait::async_trait;
use colloquy_core::tools::{BoxError, ToolHandler};
use colloquy_core::types::{FieldType, InputSchema, ToolDeclaration};
use serde::Deserialize;
use serde_json::{json, Value};

/// Weather lookups via the two Open-Meteo endpoints
pub struct WeatherTool {
    client: reqwest::Client,
    geocode_url: String,
    forecast_url: String,
}

impl WeatherTool {
    pub fn new(
        client: reqwest::Client,
        geocode_url: impl Into<String>,
        forecast_url: impl Into<String>,
    ) -> Self {
        Self {
            client,
            geocode_url: geocode_url.into(),
            forecast_url: forecast_url.into(),
        }
    }

    /// Declaration advertised to the model
    pub fn declaration() -> ToolDeclaration {
        ToolDeclaration::new(
            "weather_tool",
            "Get the current weather for a location.",
            InputSchema::new().required("location", FieldType::String),
        )
    }

    async fn geocode(&self, location: &str) -> Result<Place, BoxError> {
        let response: GeocodeResponse = self
            .client
            .get(&self.geocode_url)
            .query(&[("name", location), ("count", "1")])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        first_place(response, location)
    }

    async fn current_weather(&self, place: &Place) -> Result<CurrentWeather, BoxError> {
        let response: ForecastResponse = self
            .client
            .get(&self.forecast_url)
            .query(&[
                ("latitude", place.latitude.to_string()),
                ("longitude", place.longitude.to_string()),
                ("current_weather", "true".to_string()),
                ("temperature_unit", "celsius".to_string()),
                ("windspeed_unit", "kmh".to_string()),
                ("timezone", "auto".to_string()),
            ])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        response
            .current_weather
            .ok_or_else(|| "Open-Meteo did not return current weather".into())
    }
}

#[async_trait]
impl ToolHandler for WeatherTool {
    async fn call(&self, arguments: Value) -> Result<Value, BoxError> {
        let location = arguments
            .get("location")
            .and_then(Value::as_str)
            .ok_or("missing required argument `location`")?;

        let place = self.geocode(location).await?;
        let current = self.current_weather(&place).await?;

        Ok(json!({
            "location": place.label(),
            "temperature_c": current.temperature,
            "windspeed_kmh": current.windspeed,
            "winddirection_deg": current.winddirection,
            "condition_code": current.weathercode,
            "condition_label": condition_label(current.weathercode),
            "observed_at": current.time,
            "provider": "open-meteo",
        }))
    }
}

#[derive(Debug, Deserialize)]
struct GeocodeResponse {
    #[serde(default)]
    results: Vec<Place>,
}

#[derive(Debug, Deserialize)]
struct Place {
    name: String,
    #[serde(default)]
    country: Option<String>,
    latitude: f64,
    longitude: f64,
}

impl Place {
    /// "Name, Country" when the country is known
    fn label(&self) -> String {
        match self.country.as_deref() {
            Some(country) if !country.is_empty() => format!("{}, {country}", self.name),
            _ => self.name.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    #[serde(default)]
    current_weather: Option<CurrentWeather>,
}

#[derive(Debug, Deserialize)]
struct CurrentWeather {
    #[serde(default)]
    temperature: Option<f64>,
    #[serde(default)]
    windspeed: Option<f64>,
    #[serde(default)]
    winddirection: Option<f64>,
    #[serde(default)]
    weathercode: Option<i64>,
    #[serde(default)]
    time: Option<String>,
}

fn first_place(response: GeocodeResponse, location: &str) -> Result<Place, BoxError> {
    response
        .results
        .into_iter()
        .next()
        .ok_or_else(|| format!("Could not find coordinates for '{location}'").into())
}

/// Condensed WMO weather interpretation codes
fn condition_label(code: Option<i64>) -> Option<String> {
    let code = code?;
    Some(match code {
        0 => "Clear sky".to_string(),
        1..=3 => "Mainly clear / Partly cloudy / Overcast".to_string(),
        45 | 48 => "Fog".to_string(),
        51 | 53 | 55 => "Drizzle".to_string(),
        56 | 57 => "Freezing drizzle".to_string(),
        61 | 63 | 65 => "Rain".to_string(),
        66 | 67 => "Freezing rain".to_string(),
        71 | 73 | 75 => "Snow".to_string(),
        77 => "Snow grains".to_string(),
        80 | 81 | 82 => "Rain showers".to_string(),
        85 | 86 => "Snow showers".to_string(),
        95 => "Thunderstorm".to_string(),
        96 | 99 => "Thunderstorm with hail".to_string(),
        other => format!("Code {other}"),
    })
}
