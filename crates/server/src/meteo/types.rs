//! Typed view of the Open-Meteo forecast response.
//!
//! Only the fields the service reads are typed; everything else the
//! upstream returns is preserved in flattened maps so the `/api/weather`
//! passthrough keeps the external schema verbatim.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use utoipa::ToSchema;

/// A parsed Open-Meteo forecast response.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct ForecastPayload {
    #[serde(default)]
    pub latitude: f64,
    #[serde(default)]
    pub longitude: f64,
    #[serde(default)]
    pub timezone: String,
    #[serde(default)]
    pub current: CurrentConditions,
    #[serde(default)]
    pub hourly: HourlySeries,
    #[serde(default)]
    pub daily: DailySeries,
    #[serde(flatten)]
    #[schema(value_type = Object)]
    pub extra: Map<String, Value>,
}

/// Current conditions block (`current=` fields).
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct CurrentConditions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature_2m: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relative_humidity_2m: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub apparent_temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub precipitation: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cloud_cover: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pressure_msl: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wind_speed_10m: Option<f64>,
    #[serde(flatten)]
    #[schema(value_type = Object)]
    pub extra: Map<String, Value>,
}

/// Aligned hourly arrays (`hourly=` fields). Entries are `None` where the
/// upstream reports null.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct HourlySeries {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub time: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub temperature_2m: Vec<Option<f64>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub relative_humidity_2m: Vec<Option<f64>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub apparent_temperature: Vec<Option<f64>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub wind_speed_10m: Vec<Option<f64>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub pressure_msl: Vec<Option<f64>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cloud_cover: Vec<Option<f64>>,
    #[serde(flatten)]
    #[schema(value_type = Object)]
    pub extra: Map<String, Value>,
}

impl HourlySeries {
    /// Number of hourly entries, as reported by the `time` axis.
    pub fn len(&self) -> usize {
        self.time.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }

    /// Truncate every hourly array (passthrough extras included) to the
    /// first `limit` entries.
    pub fn truncate(&mut self, limit: usize) {
        self.time.truncate(limit);
        self.temperature_2m.truncate(limit);
        self.relative_humidity_2m.truncate(limit);
        self.apparent_temperature.truncate(limit);
        self.wind_speed_10m.truncate(limit);
        self.pressure_msl.truncate(limit);
        self.cloud_cover.truncate(limit);
        for value in self.extra.values_mut() {
            if let Value::Array(items) = value {
                items.truncate(limit);
            }
        }
    }
}

/// Aligned daily arrays (`daily=` fields); the chat formatter reads the
/// temperature extremes and precipitation sums.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct DailySeries {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub time: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub temperature_2m_max: Vec<Option<f64>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub temperature_2m_min: Vec<Option<f64>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub precipitation_sum: Vec<Option<f64>>,
    #[serde(flatten)]
    #[schema(value_type = Object)]
    pub extra: Map<String, Value>,
}
