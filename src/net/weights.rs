//! Weight storage, loading and content hashing.
//!
//! Weights are fixed-point integers at scale S and immutable once built.
//! Two JSON layouts load:
//!
//! - integer: `{"scale", "weights1", "bias1", "weights2", "bias2"}`
//! - float export: `{"weights": {"layer1_weights", ...}, "metadata": {"scale_factor"}}`,
//!   quantized by truncating `w * S` toward zero.
//!
//! Dimensions are checked on load, before any enumeration runs.

use std::path::Path;

use serde::Deserialize;

use super::{HIDDEN, INPUTS, OUTPUTS};
use crate::diagnostic::Diagnostic;
use crate::error::{LutError, Result};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Weights {
    /// Fixed-point scale every value below is encoded at.
    pub scale: i32,
    pub w1: [[i32; HIDDEN]; INPUTS],
    pub b1: [i32; HIDDEN],
    pub w2: [[i32; OUTPUTS]; HIDDEN],
    pub b2: [i32; OUTPUTS],
}

/// Integer layout, as written by hand or by `dump-weights --json`.
#[derive(Deserialize)]
struct IntegerFile {
    scale: i64,
    weights1: Vec<Vec<i64>>,
    bias1: Vec<i64>,
    weights2: Vec<Vec<i64>>,
    bias2: Vec<i64>,
}

/// Float layout of the training exporter.
#[derive(Deserialize)]
struct ExportFile {
    weights: ExportWeights,
    metadata: ExportMeta,
}

#[derive(Deserialize)]
struct ExportWeights {
    layer1_weights: Vec<Vec<f64>>,
    layer1_bias: Vec<f64>,
    layer2_weights: Vec<Vec<f64>>,
    layer2_bias: Vec<f64>,
}

#[derive(Deserialize)]
struct ExportMeta {
    scale_factor: i64,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum WeightsFile {
    Integer(IntegerFile),
    Export(ExportFile),
}

impl Weights {
    /// Build from dynamically sized arrays, rejecting any dimension mismatch.
    pub fn from_rows(
        scale: i64,
        weights1: &[Vec<i64>],
        bias1: &[i64],
        weights2: &[Vec<i64>],
        bias2: &[i64],
    ) -> Result<Weights> {
        Ok(Weights {
            scale: to_i32("scale", scale)?,
            w1: matrix("weights1", weights1)?,
            b1: vector("bias1", bias1)?,
            w2: matrix("weights2", weights2)?,
            b2: vector("bias2", bias2)?,
        })
    }

    /// Quantize float weights: `trunc(w * scale)`.
    pub fn quantize(
        scale: i64,
        weights1: &[Vec<f64>],
        bias1: &[f64],
        weights2: &[Vec<f64>],
        bias2: &[f64],
    ) -> Result<Weights> {
        let q = |v: &f64| -> i64 { (v * scale as f64).trunc() as i64 };
        let rows = |m: &[Vec<f64>]| -> Vec<Vec<i64>> {
            m.iter().map(|row| row.iter().map(q).collect()).collect()
        };
        let flat = |v: &[f64]| -> Vec<i64> { v.iter().map(q).collect() };
        Self::from_rows(
            scale,
            &rows(weights1),
            &flat(bias1),
            &rows(weights2),
            &flat(bias2),
        )
    }

    /// Parse either JSON layout.
    pub fn from_json(text: &str) -> std::result::Result<Weights, Diagnostic> {
        let file: WeightsFile = serde_json::from_str(text).map_err(|e| {
            Diagnostic::from_json(&e, text).with_help(
                "expected {\"scale\", \"weights1\", \"bias1\", \"weights2\", \"bias2\"} \
                 or a float export with \"weights\" and \"metadata\""
                    .to_string(),
            )
        })?;
        let built = match file {
            WeightsFile::Integer(f) => {
                Self::from_rows(f.scale, &f.weights1, &f.bias1, &f.weights2, &f.bias2)
            }
            WeightsFile::Export(f) => Self::quantize(
                f.metadata.scale_factor,
                &f.weights.layer1_weights,
                &f.weights.layer1_bias,
                &f.weights.layer2_weights,
                &f.weights.layer2_bias,
            ),
        };
        built.map_err(|e| Diagnostic::error(e.to_string(), None))
    }

    /// Load a JSON weights file.
    pub fn load(path: &Path) -> Result<Weights> {
        let text = std::fs::read_to_string(path).map_err(|e| LutError::io(path, e))?;
        Self::from_json(&text).map_err(|diagnostic| LutError::Parse {
            path: path.to_path_buf(),
            text,
            diagnostic,
        })
    }

    /// Resolve `builtin:<name>` or a file path.
    pub fn resolve(spec: &str) -> Result<Weights> {
        match spec.strip_prefix("builtin:") {
            Some(name) => Self::builtin(name).ok_or_else(|| {
                LutError::Config(format!(
                    "unknown built-in weights '{}' (available: {})",
                    name,
                    BUILTIN_NAMES.join(", ")
                ))
            }),
            None => Self::load(Path::new(spec)),
        }
    }

    pub fn builtin(name: &str) -> Option<Weights> {
        match name {
            "trained" => Some(Self::trained()),
            "trained-1000" => Some(Self::trained_1000()),
            "debug" => Some(Self::debug()),
            _ => None,
        }
    }

    /// Trained set the tile-ratio generators shipped with, S = 1024.
    pub fn trained() -> Weights {
        Weights {
            scale: 1024,
            w1: [
                [260, -738, 244, -260, -712, 62, 160, -861],
                [1987, -86, -392, 759, -230, -1882, -2603, -415],
                [-773, 1266, -76, -855, 1146, -638, -329, 1417],
                [645, 389, -425, 216, 356, -231, -282, 480],
                [-1599, 352, -564, -774, 496, 1606, 2691, 1009],
            ],
            b1: [-150, 1102, -8, 128, 1074, 303, 520, 1084],
            w2: [
                [-2960, -3011, -2847],
                [1289, 509, 1139],
                [384, -485, -264],
                [1332, 1446, 1235],
                [509, 1524, 960],
                [2996, 2627, 3258],
                [-3906, -3781, -4017],
                [978, 849, 777],
            ],
            b2: [773, 790, 707],
        }
    }

    /// Earlier trained set at S = 1000, evaluated on target with a `* 33 >> 15` reciprocal.
    pub fn trained_1000() -> Weights {
        Weights {
            scale: 1000,
            w1: [
                [150, 177, -745, 280, -653, -266, -652, -321],
                [400, -513, -583, 466, -260, -350, 8, -24],
                [169, -481, 388, 122, 132, 23, -156, 524],
                [-49, -436, -481, -72, 536, 275, 479, -755],
                [-266, -529, 365, 410, -644, 207, -185, -451],
            ],
            b1: [-146, -52, -215, -47, 0, 8, -104, 112],
            w2: [
                [551, 376, -414],
                [297, 290, 229],
                [316, 532, 455],
                [-14, -627, -323],
                [-46, 437, 215],
                [51, -272, -423],
                [332, 490, 728],
                [-437, -90, 343],
            ],
            b2: [-213, 79, -42],
        }
    }

    /// Hand-written bring-up weights, S = 64.
    pub fn debug() -> Weights {
        Weights {
            scale: 64,
            w1: [
                [3200, -1800, 2400, -800, 1600, 2000, -1200, 800],
                [-2400, 3600, -1600, 2800, -2000, 1400, 3200, -2600],
                [4800, -3200, 2600, -1800, 3400, -2400, 1800, 2200],
                [-1600, 2400, -3000, 1800, -2200, 2800, -1400, 3600],
                [2800, -2000, 1600, -2600, 2400, -1800, 2000, -1400],
            ],
            b1: [800, -600, 1200, -400, 600, -800, 1000, -200],
            w2: [
                [1800, -2400, 1600],
                [-1200, 2800, -2000],
                [2400, -1600, 2200],
                [-1800, 1400, -2600],
                [1600, -2200, 1800],
                [-2000, 2600, -1400],
                [2200, -1800, 2000],
                [-1400, 2400, -1600],
            ],
            b2: [-400, 200, -300],
        }
    }

    /// Canonical little-endian byte image: scale, w1, b1, w2, b2 as i32.
    pub fn to_le_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(4 * (1 + INPUTS * HIDDEN + HIDDEN + HIDDEN * OUTPUTS + OUTPUTS));
        let mut push = |v: i32| bytes.extend_from_slice(&v.to_le_bytes());
        push(self.scale);
        self.w1.iter().flatten().for_each(|&v| push(v));
        self.b1.iter().for_each(|&v| push(v));
        self.w2.iter().flatten().for_each(|&v| push(v));
        self.b2.iter().for_each(|&v| push(v));
        bytes
    }

    /// Content hash of the weights (blake3, hex).
    pub fn hash(&self) -> String {
        blake3::hash(&self.to_le_bytes()).to_hex().to_string()
    }

    /// Largest absolute value across all weights and biases.
    pub fn max_abs(&self) -> i32 {
        self.w1
            .iter()
            .flatten()
            .chain(self.b1.iter())
            .chain(self.w2.iter().flatten())
            .chain(self.b2.iter())
            .map(|v| v.saturating_abs())
            .max()
            .unwrap_or(0)
    }

    /// Integer JSON layout accepted by `from_json`.
    pub fn to_json(&self) -> String {
        serde_json::json!({
            "scale": self.scale,
            "weights1": self.w1,
            "bias1": self.b1,
            "weights2": self.w2,
            "bias2": self.b2,
        })
        .to_string()
    }
}

pub const BUILTIN_NAMES: [&str; 3] = ["trained", "trained-1000", "debug"];

fn to_i32(what: &str, v: i64) -> Result<i32> {
    i32::try_from(v).map_err(|_| LutError::Config(format!("{} value {} does not fit 32 bits", what, v)))
}

fn vector<const N: usize>(what: &str, v: &[i64]) -> Result<[i32; N]> {
    if v.len() != N {
        return Err(LutError::dimension(what, N, v.len()));
    }
    let mut out = [0i32; N];
    for (o, &x) in out.iter_mut().zip(v) {
        *o = to_i32(what, x)?;
    }
    Ok(out)
}

fn matrix<const R: usize, const C: usize>(what: &str, m: &[Vec<i64>]) -> Result<[[i32; C]; R]> {
    if m.len() != R {
        return Err(LutError::dimension(format!("{} rows", what), R, m.len()));
    }
    let mut out = [[0i32; C]; R];
    for (r, (o, row)) in out.iter_mut().zip(m).enumerate() {
        *o = vector(&format!("{} row {}", what, r), row)?;
    }
    Ok(out)
}
