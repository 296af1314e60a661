//! Feature engineering for the forecast model.
//!
//! Turns the upstream hourly series into the fixed `[input_window, 7]`
//! tensor the checkpoint was trained on: raw extraction with fixed
//! defaults for gaps, two derived channels (dew-point proxy and
//! vapour-pressure deficit), left-padding to the full window, and
//! per-channel min-max scaling into [0,1].

use ndarray::Array2;
use serde::Deserialize;

use crate::meteo::HourlySeries;

/// Channels per feature row: temperature, relative humidity, dew-point
/// proxy, wind speed, pressure, cloud cover, vapour-pressure deficit.
pub const FEATURE_COUNT: usize = 7;

/// Substitutes for missing upstream readings.
pub const DEFAULT_TEMPERATURE: f64 = 20.0;
pub const DEFAULT_HUMIDITY: f64 = 50.0;
pub const DEFAULT_DEW_POINT: f64 = 15.0;
pub const DEFAULT_WIND_SPEED: f64 = 10.0;
pub const DEFAULT_PRESSURE: f64 = 1013.0;
pub const DEFAULT_CLOUD_COVER: f64 = 50.0;
pub const DEFAULT_VPD: f64 = 0.5;

/// Pad row used when no hourly data is available at all.
const DEFAULT_ROW: [f64; FEATURE_COUNT] = [
    DEFAULT_TEMPERATURE,
    DEFAULT_HUMIDITY,
    DEFAULT_DEW_POINT,
    DEFAULT_WIND_SPEED,
    DEFAULT_PRESSURE,
    DEFAULT_CLOUD_COVER,
    DEFAULT_VPD,
];

/// A closed reference interval for one channel.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct Range {
    pub min: f64,
    pub max: f64,
}

impl Range {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Map `value` into [0,1] relative to this range, clipped.
    pub fn normalize(&self, value: f64) -> f64 {
        ((value - self.min) / (self.max - self.min)).clamp(0.0, 1.0)
    }

    /// Map a [0,1] value back onto this range (no clipping).
    pub fn denormalize(&self, value: f64) -> f64 {
        value * (self.max - self.min) + self.min
    }
}

/// The single source of truth for normalization ranges, loaded with the
/// model config. Forward normalization and fallback denormalization both
/// read from here, so training-time and inference-time ranges cannot
/// drift apart.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct NormalizationConfig {
    pub temperature: Range,
    pub relative_humidity: Range,
    pub dew_point: Range,
    pub wind_speed: Range,
    pub pressure_msl: Range,
    pub cloud_cover: Range,
    pub vapour_pressure_deficit: Range,
    pub output_temperature: Range,
    pub output_relative_humidity: Range,
    pub output_wind_speed: Range,
}

impl Default for NormalizationConfig {
    fn default() -> Self {
        Self {
            temperature: Range::new(-20.0, 50.0),
            relative_humidity: Range::new(0.0, 100.0),
            dew_point: Range::new(-30.0, 35.0),
            wind_speed: Range::new(0.0, 50.0),
            pressure_msl: Range::new(950.0, 1050.0),
            cloud_cover: Range::new(0.0, 100.0),
            vapour_pressure_deficit: Range::new(0.0, 4.0),
            output_temperature: Range::new(7.10, 41.70),
            output_relative_humidity: Range::new(6.00, 100.00),
            output_wind_speed: Range::new(0.00, 43.30),
        }
    }
}

impl NormalizationConfig {
    /// Input ranges in feature-row order.
    pub fn input_ranges(&self) -> [Range; FEATURE_COUNT] {
        [
            self.temperature,
            self.relative_humidity,
            self.dew_point,
            self.wind_speed,
            self.pressure_msl,
            self.cloud_cover,
            self.vapour_pressure_deficit,
        ]
    }

    /// Fallback output ranges in model-output order (temperature,
    /// relative humidity, wind speed).
    pub fn output_ranges(&self) -> [Range; 3] {
        [
            self.output_temperature,
            self.output_relative_humidity,
            self.output_wind_speed,
        ]
    }
}

/// Saturation vapour pressure in kPa for a temperature in °C.
fn saturation_vapour_pressure(temperature: f64) -> f64 {
    0.611 * ((17.27 * temperature) / (temperature + 237.3)).exp()
}

fn reading_at(series: &[Option<f64>], index: usize) -> Option<f64> {
    series.get(index).copied().flatten()
}

/// Extract one raw feature row per available hour (at most `window`).
fn feature_rows(hourly: &HourlySeries, window: usize) -> Vec<[f64; FEATURE_COUNT]> {
    let hours = hourly.len().min(window);
    let mut rows = Vec::with_capacity(hours);

    for i in 0..hours {
        let temperature = reading_at(&hourly.temperature_2m, i).unwrap_or(DEFAULT_TEMPERATURE);
        let humidity = reading_at(&hourly.relative_humidity_2m, i).unwrap_or(DEFAULT_HUMIDITY);

        // The checkpoint was trained with apparent temperature standing in
        // for dew point; the formula only fills gaps.
        let dew_point = reading_at(&hourly.apparent_temperature, i)
            .unwrap_or_else(|| temperature - (100.0 - humidity) / 5.0);

        let wind_speed = reading_at(&hourly.wind_speed_10m, i).unwrap_or(DEFAULT_WIND_SPEED);
        let pressure = reading_at(&hourly.pressure_msl, i).unwrap_or(DEFAULT_PRESSURE);
        let cloud_cover = reading_at(&hourly.cloud_cover, i).unwrap_or(DEFAULT_CLOUD_COVER);

        let svp = saturation_vapour_pressure(temperature);
        let vpd = svp * (1.0 - humidity / 100.0);

        rows.push([
            temperature,
            humidity,
            dew_point,
            wind_speed,
            pressure,
            cloud_cover,
            vpd,
        ]);
    }

    rows
}

/// Left-pad to exactly `window` rows by repeating the earliest available
/// row (or the all-defaults row when the series is empty).
fn pad_rows(rows: Vec<[f64; FEATURE_COUNT]>, window: usize) -> Vec<[f64; FEATURE_COUNT]> {
    if rows.len() >= window {
        return rows;
    }
    let pad = rows.first().copied().unwrap_or(DEFAULT_ROW);
    let mut padded = vec![pad; window - rows.len()];
    padded.extend(rows);
    padded
}

/// Prepare the normalized model input tensor of shape `[window, 7]`.
pub fn prepare_input(
    hourly: &HourlySeries,
    window: usize,
    normalization: &NormalizationConfig,
) -> Array2<f32> {
    let rows = pad_rows(feature_rows(hourly, window), window);
    let ranges = normalization.input_ranges();

    Array2::from_shape_fn((window, FEATURE_COUNT), |(i, j)| {
        ranges[j].normalize(rows[i][j]) as f32
    })
}
