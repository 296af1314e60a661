//! Open-Meteo forecast client.
//!
//! One GET per request, no retry, no caching; failures surface as
//! [`Error`] and are translated to HTTP errors at the route boundary.

mod types;

pub use types::{CurrentConditions, DailySeries, ForecastPayload, HourlySeries};

use async_trait::async_trait;

/// Open-Meteo forecast endpoint.
const FORECAST_URL: &str = "https://api.open-meteo.com/v1/forecast";

/// Current-conditions fields requested per call.
const CURRENT_FIELDS: &str = "temperature_2m,relative_humidity_2m,apparent_temperature,\
precipitation,rain,showers,snowfall,weather_code,cloud_cover,pressure_msl,surface_pressure,\
wind_speed_10m,wind_direction_10m,wind_gusts_10m";

/// Hourly fields requested per call.
const HOURLY_FIELDS: &str = "temperature_2m,relative_humidity_2m,apparent_temperature,\
precipitation_probability,precipitation,rain,showers,snowfall,snow_depth,weather_code,\
pressure_msl,surface_pressure,cloud_cover,visibility,wind_speed_10m,wind_direction_10m,\
uv_index";

/// Daily fields requested per call.
const DAILY_FIELDS: &str = "weather_code,temperature_2m_max,temperature_2m_min,\
apparent_temperature_max,apparent_temperature_min,sunrise,sunset,uv_index_max,\
precipitation_sum,rain_sum,showers_sum,snowfall_sum,precipitation_hours,\
precipitation_probability_max,wind_speed_10m_max,wind_gusts_10m_max";

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Failed to reach the forecast api: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Forecast api returned status {status}: {message}")]
    Upstream { status: u16, message: String },
}

/// Source of forecast payloads for a coordinate pair.
#[async_trait]
pub trait ForecastProvider: Send + Sync {
    async fn fetch(&self, latitude: f64, longitude: f64) -> Result<ForecastPayload, Error>;
}

/// HTTP client for the public Open-Meteo forecast API.
#[derive(Debug, Clone)]
pub struct OpenMeteoClient {
    client: reqwest::Client,
    base_url: String,
}

impl OpenMeteoClient {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: FORECAST_URL.to_string(),
        }
    }

    /// Point the client at a different endpoint (test servers).
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    fn query(latitude: f64, longitude: f64) -> Vec<(&'static str, String)> {
        vec![
            ("latitude", latitude.to_string()),
            ("longitude", longitude.to_string()),
            ("current", CURRENT_FIELDS.to_string()),
            ("hourly", HOURLY_FIELDS.to_string()),
            ("daily", DAILY_FIELDS.to_string()),
            ("timezone", "auto".to_string()),
            ("forecast_days", "7".to_string()),
        ]
    }
}

impl Default for OpenMeteoClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ForecastProvider for OpenMeteoClient {
    async fn fetch(&self, latitude: f64, longitude: f64) -> Result<ForecastPayload, Error> {
        let response = self
            .client
            .get(&self.base_url)
            .query(&Self::query(latitude, longitude))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            return Err(Error::Upstream {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response.json::<ForecastPayload>().await?)
    }
}
