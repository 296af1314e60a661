//! 72-hour forecast predictor.
//!
//! Loads the checkpoint, config, and optional scaler once at startup and
//! serves read-only forward passes for the process lifetime. A missing or
//! invalid artifact degrades the predictor to a not-loaded state that
//! every predict call reports as a structured error; nothing here aborts
//! the process.

pub mod features;
pub mod model;
pub mod scaler;

use std::path::Path;

use log::{info, warn};
use serde::Serialize;
use utoipa::ToSchema;

use crate::meteo::ForecastPayload;
use features::prepare_input;
use model::{ModelConfig, Network};
use scaler::OutputScaler;

/// Artifact file names inside the model directory.
pub const CONFIG_FILE: &str = "model_config.json";
pub const WEIGHTS_FILE: &str = "model_weights.npz";
pub const SCALER_FILE: &str = "scaling_params.json";

/// Physical clamp applied after denormalization, per channel.
const TEMPERATURE_BOUNDS: (f64, f64) = (-50.0, 50.0);
const HUMIDITY_BOUNDS: (f64, f64) = (0.0, 100.0);
const WIND_SPEED_BOUNDS: (f64, f64) = (0.0, 100.0);

#[derive(thiserror::Error, Debug)]
pub enum PredictError {
    #[error("Model not loaded")]
    NotLoaded,
}

/// One projected hour, 1-based.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct HourlyPrediction {
    pub hour: usize,
    pub temperature: f64,
    pub relative_humidity: f64,
    pub wind_speed: f64,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PredictionSummary {
    pub avg_temperature: f64,
    pub max_temperature: f64,
    pub min_temperature: f64,
    pub avg_humidity: f64,
    pub avg_wind_speed: f64,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PredictionReport {
    pub hourly: Vec<HourlyPrediction>,
    pub summary: PredictionSummary,
}

/// The loaded (or degraded) prediction component. Constructed once in
/// `build_app_state` and shared read-only behind an `Arc`.
pub struct Predictor {
    config: ModelConfig,
    network: Option<Network>,
    scaler: Option<OutputScaler>,
}

impl Predictor {
    /// Read all artifacts from `model_dir`. Failures are logged and
    /// degrade the predictor instead of propagating.
    pub fn load(model_dir: &Path) -> Self {
        let config_path = model_dir.join(CONFIG_FILE);
        let config = match ModelConfig::from_file(&config_path) {
            Ok(config) => config,
            Err(err) => {
                warn!(
                    "could not read model config {}: {}; using defaults",
                    config_path.display(),
                    err
                );
                ModelConfig::default()
            }
        };

        let weights_path = model_dir.join(WEIGHTS_FILE);
        let network = match Network::from_npz(&weights_path, &config) {
            Ok(network) => {
                info!("model weights loaded from {}", weights_path.display());
                Some(network)
            }
            Err(err) => {
                warn!(
                    "model weights not loaded from {}: {}",
                    weights_path.display(),
                    err
                );
                None
            }
        };

        let scaler_path = model_dir.join(SCALER_FILE);
        let scaler = if scaler_path.exists() {
            match OutputScaler::from_file(&scaler_path, config.output_dim) {
                Ok(scaler) => {
                    info!("output scaler loaded from {}", scaler_path.display());
                    Some(scaler)
                }
                Err(err) => {
                    warn!(
                        "output scaler not loaded from {}: {}; using fallback ranges",
                        scaler_path.display(),
                        err
                    );
                    None
                }
            }
        } else {
            warn!(
                "no output scaler at {}; using fallback ranges",
                scaler_path.display()
            );
            None
        };

        Self {
            config,
            network,
            scaler,
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.network.is_some()
    }

    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    /// Project the next `output_window` hours from an upstream payload.
    pub fn predict(&self, payload: &ForecastPayload) -> Result<PredictionReport, PredictError> {
        let network = self.network.as_ref().ok_or(PredictError::NotLoaded)?;

        let input = prepare_input(
            &payload.hourly,
            self.config.input_window,
            &self.config.normalization,
        );
        let raw = network.forward(&input);

        let fallback = OutputScaler::from_ranges(&self.config.normalization.output_ranges());
        let scaler = self.scaler.as_ref().unwrap_or(&fallback);

        let mut hourly = Vec::with_capacity(self.config.output_window);
        for (i, row) in raw.rows().into_iter().enumerate() {
            let temperature = scaler
                .inverse(0, f64::from(row[0]))
                .clamp(TEMPERATURE_BOUNDS.0, TEMPERATURE_BOUNDS.1);
            let relative_humidity = scaler
                .inverse(1, f64::from(row[1]))
                .clamp(HUMIDITY_BOUNDS.0, HUMIDITY_BOUNDS.1);
            let wind_speed = scaler
                .inverse(2, f64::from(row[2]))
                .clamp(WIND_SPEED_BOUNDS.0, WIND_SPEED_BOUNDS.1);

            hourly.push(HourlyPrediction {
                hour: i + 1,
                temperature,
                relative_humidity,
                wind_speed,
            });
        }

        let summary = summarize(&hourly);
        Ok(PredictionReport { hourly, summary })
    }
}

fn summarize(hourly: &[HourlyPrediction]) -> PredictionSummary {
    let count = hourly.len().max(1) as f64;
    let mut summary = PredictionSummary {
        avg_temperature: 0.0,
        max_temperature: f64::NEG_INFINITY,
        min_temperature: f64::INFINITY,
        avg_humidity: 0.0,
        avg_wind_speed: 0.0,
    };

    for record in hourly {
        summary.avg_temperature += record.temperature;
        summary.max_temperature = summary.max_temperature.max(record.temperature);
        summary.min_temperature = summary.min_temperature.min(record.temperature);
        summary.avg_humidity += record.relative_humidity;
        summary.avg_wind_speed += record.wind_speed;
    }

    summary.avg_temperature /= count;
    summary.avg_humidity /= count;
    summary.avg_wind_speed /= count;
    summary
}
