//! The pretrained sequence model: config, checkpoint loading, and the
//! forward pass.
//!
//! The architecture mirrors the training-side network exactly: input
//! projection, additive sinusoidal positional encoding, a stack of
//! post-norm transformer encoder layers (multi-head self-attention +
//! GELU feed-forward), mean pooling over time, and a two-layer GELU
//! projection head emitting `output_window x output_dim` values.
//!
//! Weights are read from an `.npz` archive whose entries are named like
//! the exported PyTorch state dict. Every tensor shape is validated
//! against the config before the network is accepted.

use std::fs::File;
use std::path::Path;

use ndarray::{s, Array1, Array2, Axis};
use ndarray_npy::NpzReader;
use serde::Deserialize;

use super::features::NormalizationConfig;

/// Feed-forward width used when the config omits it (the training
/// framework's encoder-layer default).
const DEFAULT_DIM_FEEDFORWARD: usize = 2048;

/// Layer-norm epsilon, matching the training side.
const LAYER_NORM_EPS: f32 = 1e-5;

#[derive(thiserror::Error, Debug)]
pub enum ModelError {
    #[error("Failed to read model artifact: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse model config: {0}")]
    Config(#[from] serde_json::Error),
    #[error("Failed to read weight archive: {0}")]
    Npz(#[from] ndarray_npy::ReadNpzError),
    #[error("Weight tensor {name} has shape {got:?}, expected {expected:?}")]
    Shape {
        name: String,
        expected: Vec<usize>,
        got: Vec<usize>,
    },
}

/// Architecture and normalization parameters persisted next to the
/// checkpoint as `model_config.json`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ModelConfig {
    pub input_dim: usize,
    pub model_dim: usize,
    pub num_heads: usize,
    pub num_layers: usize,
    #[serde(default = "default_dim_feedforward")]
    pub dim_feedforward: usize,
    #[serde(default)]
    pub dropout: f64,
    pub input_window: usize,
    pub output_window: usize,
    pub output_dim: usize,
    #[serde(default)]
    pub normalization: NormalizationConfig,
}

fn default_dim_feedforward() -> usize {
    DEFAULT_DIM_FEEDFORWARD
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            input_dim: 7,
            model_dim: 128,
            num_heads: 8,
            num_layers: 4,
            dim_feedforward: DEFAULT_DIM_FEEDFORWARD,
            dropout: 0.1,
            input_window: 168,
            output_window: 72,
            output_dim: 3,
            normalization: NormalizationConfig::default(),
        }
    }
}

impl ModelConfig {
    pub fn from_file(path: &Path) -> Result<Self, ModelError> {
        let file = File::open(path)?;
        Ok(serde_json::from_reader(file)?)
    }
}

/// One post-norm transformer encoder layer.
#[derive(Debug)]
struct EncoderLayer {
    in_proj_weight: Array2<f32>,
    in_proj_bias: Array1<f32>,
    out_proj_weight: Array2<f32>,
    out_proj_bias: Array1<f32>,
    linear1_weight: Array2<f32>,
    linear1_bias: Array1<f32>,
    linear2_weight: Array2<f32>,
    linear2_bias: Array1<f32>,
    norm1_weight: Array1<f32>,
    norm1_bias: Array1<f32>,
    norm2_weight: Array1<f32>,
    norm2_bias: Array1<f32>,
}

impl EncoderLayer {
    fn forward(&self, x: Array2<f32>, num_heads: usize) -> Array2<f32> {
        let attn = self.self_attention(&x, num_heads);
        let x = layer_norm(&(x + attn), &self.norm1_weight, &self.norm1_bias);

        let hidden = gelu(x.dot(&self.linear1_weight.t()) + &self.linear1_bias);
        let ff = hidden.dot(&self.linear2_weight.t()) + &self.linear2_bias;
        layer_norm(&(x + ff), &self.norm2_weight, &self.norm2_bias)
    }

    fn self_attention(&self, x: &Array2<f32>, num_heads: usize) -> Array2<f32> {
        let (steps, dim) = x.dim();
        let head_dim = dim / num_heads;
        let scale = (head_dim as f32).sqrt();

        // Packed Q/K/V projection, then per-head scaled dot-product.
        let qkv = x.dot(&self.in_proj_weight.t()) + &self.in_proj_bias;
        let mut context = Array2::<f32>::zeros((steps, dim));

        for head in 0..num_heads {
            let offset = head * head_dim;
            let q = qkv.slice(s![.., offset..offset + head_dim]);
            let k = qkv.slice(s![.., dim + offset..dim + offset + head_dim]);
            let v = qkv.slice(s![.., 2 * dim + offset..2 * dim + offset + head_dim]);

            let mut scores = q.dot(&k.t()) / scale;
            softmax_rows(&mut scores);
            context
                .slice_mut(s![.., offset..offset + head_dim])
                .assign(&scores.dot(&v));
        }

        context.dot(&self.out_proj_weight.t()) + &self.out_proj_bias
    }
}

/// The loaded network, immutable after construction.
#[derive(Debug)]
pub struct Network {
    input_proj_weight: Array2<f32>,
    input_proj_bias: Array1<f32>,
    positional: Array2<f32>,
    layers: Vec<EncoderLayer>,
    head_fc1_weight: Array2<f32>,
    head_fc1_bias: Array1<f32>,
    head_fc2_weight: Array2<f32>,
    head_fc2_bias: Array1<f32>,
    num_heads: usize,
    output_window: usize,
    output_dim: usize,
}

impl Network {
    /// Load and shape-check the checkpoint against `config`.
    pub fn from_npz(path: &Path, config: &ModelConfig) -> Result<Self, ModelError> {
        let file = File::open(path)?;
        let mut npz = NpzReader::new(file)?;

        let d = config.model_dim;
        let ff = config.dim_feedforward;
        let head = d * 2;
        let out = config.output_window * config.output_dim;

        let mut layers = Vec::with_capacity(config.num_layers);
        for i in 0..config.num_layers {
            let p = format!("transformer.layers.{i}");
            layers.push(EncoderLayer {
                in_proj_weight: tensor2(&mut npz, &format!("{p}.self_attn.in_proj_weight"), (3 * d, d))?,
                in_proj_bias: tensor1(&mut npz, &format!("{p}.self_attn.in_proj_bias"), 3 * d)?,
                out_proj_weight: tensor2(&mut npz, &format!("{p}.self_attn.out_proj.weight"), (d, d))?,
                out_proj_bias: tensor1(&mut npz, &format!("{p}.self_attn.out_proj.bias"), d)?,
                linear1_weight: tensor2(&mut npz, &format!("{p}.linear1.weight"), (ff, d))?,
                linear1_bias: tensor1(&mut npz, &format!("{p}.linear1.bias"), ff)?,
                linear2_weight: tensor2(&mut npz, &format!("{p}.linear2.weight"), (d, ff))?,
                linear2_bias: tensor1(&mut npz, &format!("{p}.linear2.bias"), d)?,
                norm1_weight: tensor1(&mut npz, &format!("{p}.norm1.weight"), d)?,
                norm1_bias: tensor1(&mut npz, &format!("{p}.norm1.bias"), d)?,
                norm2_weight: tensor1(&mut npz, &format!("{p}.norm2.weight"), d)?,
                norm2_bias: tensor1(&mut npz, &format!("{p}.norm2.bias"), d)?,
            });
        }

        Ok(Self {
            input_proj_weight: tensor2(&mut npz, "input_proj.weight", (d, config.input_dim))?,
            input_proj_bias: tensor1(&mut npz, "input_proj.bias", d)?,
            positional: positional_encoding(config.input_window, d),
            layers,
            head_fc1_weight: tensor2(&mut npz, "output_proj.0.weight", (head, d))?,
            head_fc1_bias: tensor1(&mut npz, "output_proj.0.bias", head)?,
            head_fc2_weight: tensor2(&mut npz, "output_proj.3.weight", (out, head))?,
            head_fc2_bias: tensor1(&mut npz, "output_proj.3.bias", out)?,
            num_heads: config.num_heads,
            output_window: config.output_window,
            output_dim: config.output_dim,
        })
    }

    /// One eval-mode forward pass: `[input_window, input_dim]` in,
    /// `[output_window, output_dim]` out. Dropout is identity at
    /// inference, so identical inputs produce identical outputs.
    pub fn forward(&self, input: &Array2<f32>) -> Array2<f32> {
        let mut x = input.dot(&self.input_proj_weight.t()) + &self.input_proj_bias;
        x += &self.positional;

        for layer in &self.layers {
            x = layer.forward(x, self.num_heads);
        }

        let pooled = x.sum_axis(Axis(0)) / x.nrows() as f32;

        let hidden = gelu(pooled.dot(&self.head_fc1_weight.t()) + &self.head_fc1_bias);
        let flat = hidden.dot(&self.head_fc2_weight.t()) + &self.head_fc2_bias;

        Array2::from_shape_fn((self.output_window, self.output_dim), |(i, j)| {
            flat[i * self.output_dim + j]
        })
    }
}

/// Sinusoidal positional encoding table of shape `[len, dim]`.
fn positional_encoding(len: usize, dim: usize) -> Array2<f32> {
    let mut pe = Array2::<f32>::zeros((len, dim));
    for pos in 0..len {
        for i in (0..dim).step_by(2) {
            let term = pos as f32 * (-(i as f32) * (10000f32).ln() / dim as f32).exp();
            pe[[pos, i]] = term.sin();
            if i + 1 < dim {
                pe[[pos, i + 1]] = term.cos();
            }
        }
    }
    pe
}

fn softmax_rows(m: &mut Array2<f32>) {
    for mut row in m.rows_mut() {
        let max = row.fold(f32::NEG_INFINITY, |a, &b| a.max(b));
        row.mapv_inplace(|v| (v - max).exp());
        let sum = row.sum();
        row.mapv_inplace(|v| v / sum);
    }
}

fn layer_norm(x: &Array2<f32>, weight: &Array1<f32>, bias: &Array1<f32>) -> Array2<f32> {
    let dim = x.ncols() as f32;
    let mut out = Array2::<f32>::zeros(x.dim());
    for (i, row) in x.rows().into_iter().enumerate() {
        let mean = row.sum() / dim;
        let var = row.fold(0.0, |acc, &v| acc + (v - mean) * (v - mean)) / dim;
        let denom = (var + LAYER_NORM_EPS).sqrt();
        for (j, &v) in row.iter().enumerate() {
            out[[i, j]] = (v - mean) / denom * weight[j] + bias[j];
        }
    }
    out
}

/// Exact GELU, as the training side uses: `0.5x(1 + erf(x/sqrt(2)))`.
fn gelu<D: ndarray::Dimension>(x: ndarray::Array<f32, D>) -> ndarray::Array<f32, D> {
    x.mapv(|v| 0.5 * v * (1.0 + erf(v * std::f32::consts::FRAC_1_SQRT_2)))
}

/// Abramowitz & Stegun 7.1.26 rational approximation (|error| < 1.5e-7),
/// evaluated in f64.
fn erf(x: f32) -> f32 {
    let sign = if x < 0.0 { -1.0f64 } else { 1.0f64 };
    let x = f64::from(x.abs());

    let t = 1.0 / (1.0 + 0.3275911 * x);
    let poly = t
        * (0.254829592
            + t * (-0.284496736 + t * (1.421413741 + t * (-1.453152027 + t * 1.061405429))));
    (sign * (1.0 - poly * (-x * x).exp())) as f32
}

fn tensor2(
    npz: &mut NpzReader<File>,
    name: &str,
    expected: (usize, usize),
) -> Result<Array2<f32>, ModelError> {
    let array: Array2<f32> = read_entry(npz, name)?;
    if array.dim() != expected {
        return Err(ModelError::Shape {
            name: name.to_string(),
            expected: vec![expected.0, expected.1],
            got: array.shape().to_vec(),
        });
    }
    Ok(array)
}

fn tensor1(npz: &mut NpzReader<File>, name: &str, expected: usize) -> Result<Array1<f32>, ModelError> {
    let array: Array1<f32> = read_entry(npz, name)?;
    if array.len() != expected {
        return Err(ModelError::Shape {
            name: name.to_string(),
            expected: vec![expected],
            got: array.shape().to_vec(),
        });
    }
    Ok(array)
}

/// Fetch an archive entry, tolerating the `.npy` suffix numpy's `savez`
/// appends to member names.
fn read_entry<S, D>(
    npz: &mut NpzReader<File>,
    name: &str,
) -> Result<ndarray::ArrayBase<S, D>, ModelError>
where
    S: ndarray::DataOwned<Elem = f32>,
    D: ndarray::Dimension,
{
    match npz.by_name(name) {
        Ok(array) => Ok(array),
        Err(_) => Ok(npz.by_name(&format!("{name}.npy"))?),
    }
}

/// Build a network with deterministic pseudo-random weights for a given
/// config. Test-only; real weights come from the checkpoint.
#[cfg(test)]
pub(crate) fn test_network_for(config: &ModelConfig) -> Network {
    let mut state = 0x2545f491u32;
    let mut gen = move || {
        state = state.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
        ((state >> 8) as f32 / (1u32 << 24) as f32 - 0.5) * 0.2
    };

    let d = config.model_dim;
    let ff = config.dim_feedforward;
    let layers = (0..config.num_layers)
        .map(|_| EncoderLayer {
            in_proj_weight: Array2::from_shape_fn((3 * d, d), |_| gen()),
            in_proj_bias: Array1::from_shape_fn(3 * d, |_| gen()),
            out_proj_weight: Array2::from_shape_fn((d, d), |_| gen()),
            out_proj_bias: Array1::from_shape_fn(d, |_| gen()),
            linear1_weight: Array2::from_shape_fn((ff, d), |_| gen()),
            linear1_bias: Array1::from_shape_fn(ff, |_| gen()),
            linear2_weight: Array2::from_shape_fn((d, ff), |_| gen()),
            linear2_bias: Array1::from_shape_fn(d, |_| gen()),
            norm1_weight: Array1::ones(d),
            norm1_bias: Array1::zeros(d),
            norm2_weight: Array1::ones(d),
            norm2_bias: Array1::zeros(d),
        })
        .collect();

    let out = config.output_window * config.output_dim;
    Network {
        input_proj_weight: Array2::from_shape_fn((d, config.input_dim), |_| gen()),
        input_proj_bias: Array1::from_shape_fn(d, |_| gen()),
        positional: positional_encoding(config.input_window, d),
        layers,
        head_fc1_weight: Array2::from_shape_fn((2 * d, d), |_| gen()),
        head_fc1_bias: Array1::from_shape_fn(2 * d, |_| gen()),
        head_fc2_weight: Array2::from_shape_fn((out, 2 * d), |_| gen()),
        head_fc2_bias: Array1::from_shape_fn(out, |_| gen()),
        num_heads: config.num_heads,
        output_window: config.output_window,
        output_dim: config.output_dim,
    }
}
