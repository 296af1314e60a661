//! Output denormalization.
//!
//! Prefers the min-max scaler persisted by the training run
//! (`scaling_params.json`); the model-config fallback ranges are used
//! when no scaler artifact is present.

use std::fs::File;
use std::path::Path;

use serde::Deserialize;

use super::features::Range;

#[derive(thiserror::Error, Debug)]
pub enum ScalerError {
    #[error("Failed to read scaler artifact: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse scaler artifact: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Scaler covers {got} features, model outputs {expected}")]
    ChannelMismatch { expected: usize, got: usize },
}

/// On-disk schema written by the training pipeline.
#[derive(Debug, Clone, Deserialize)]
pub struct ScalingParams {
    pub features: Vec<String>,
    pub min_values: Vec<f64>,
    pub max_values: Vec<f64>,
    pub ranges: Vec<f64>,
}

/// Inverse min-max transform over the model's output channels.
#[derive(Debug, Clone)]
pub struct OutputScaler {
    mins: Vec<f64>,
    ranges: Vec<f64>,
}

impl OutputScaler {
    pub fn from_file(path: &Path, output_dim: usize) -> Result<Self, ScalerError> {
        let file = File::open(path)?;
        let params: ScalingParams = serde_json::from_reader(file)?;
        Self::from_params(params, output_dim)
    }

    pub fn from_params(params: ScalingParams, output_dim: usize) -> Result<Self, ScalerError> {
        if params.min_values.len() != output_dim || params.ranges.len() != output_dim {
            return Err(ScalerError::ChannelMismatch {
                expected: output_dim,
                got: params.min_values.len().min(params.ranges.len()),
            });
        }
        Ok(Self {
            mins: params.min_values,
            ranges: params.ranges,
        })
    }

    /// Build the fallback scaler from the config's output ranges.
    pub fn from_ranges(ranges: &[Range]) -> Self {
        Self {
            mins: ranges.iter().map(|r| r.min).collect(),
            ranges: ranges.iter().map(|r| r.max - r.min).collect(),
        }
    }

    /// Map a [0,1] model output back to the channel's physical scale.
    pub fn inverse(&self, channel: usize, value: f64) -> f64 {
        value * self.ranges[channel] + self.mins[channel]
    }
}
