//! Pipeline configuration: one struct carrying everything that varies
//! between table generations (axis bounds, normalization constants,
//! scale, storage width, packing, action encoding).
//!
//! Each historical table variant is one value of this struct (see
//! `preset`), not a separate code path. Custom configurations load from TOML.

pub mod preset;

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::diagnostic::Diagnostic;
use crate::error::{LutError, Result};
use crate::fixed::{Reciprocal, Rescale};
use crate::lut::domain::Axes;
use crate::lut::pack::Packing;
use crate::net::{ActionOrder, Normalization, Normalizer};

pub use preset::{preset, PRESET_NAMES};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PipelineConfig {
    pub name: String,
    /// Fixed-point scale of the weights; the evaluator rescales by exactly this.
    pub scale: i32,
    /// Truncate hidden and output sums to 16 bits.
    #[serde(default)]
    pub narrow_activations: bool,
    pub packing: Packing,
    /// Meaning of decision codes 0, 1, 2 on the target.
    pub actions: ActionOrder,
    /// Required when `scale` is not a power of two.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reciprocal: Option<Reciprocal>,
    pub normalization: Normalization,
    pub axes: Axes,
}

impl PipelineConfig {
    /// Check every constraint that can be checked without weights.
    pub fn validate(&self) -> Result<()> {
        self.axes.validate()?;
        self.rescale()?;
        if !self.actions.is_permutation() {
            return Err(LutError::Config(format!(
                "actions must name stay, up and down once each, got [{}]",
                self.actions
            )));
        }
        self.normalizer()?;
        Ok(())
    }

    pub fn rescale(&self) -> Result<Rescale> {
        Rescale::for_scale(self.scale, self.reciprocal)
    }

    pub fn normalizer(&self) -> Result<Normalizer> {
        Normalizer::new(self.normalization, self.scale, self.axes)
    }

    /// Number of decisions in the table.
    pub fn entries(&self) -> usize {
        self.axes.entries()
    }

    /// Byte length of the packed table.
    pub fn table_bytes(&self) -> usize {
        self.packing.packed_len(self.entries())
    }

    pub fn from_toml(text: &str) -> std::result::Result<PipelineConfig, Diagnostic> {
        toml::from_str(text).map_err(|e| Diagnostic::from_toml(&e))
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| LutError::Config(e.to_string()))
    }

    /// Load and validate a TOML configuration file.
    pub fn load(path: &Path) -> Result<PipelineConfig> {
        let text = std::fs::read_to_string(path).map_err(|e| LutError::io(path, e))?;
        let config = Self::from_toml(&text).map_err(|diagnostic| LutError::Parse {
            path: path.to_path_buf(),
            text: text.clone(),
            diagnostic,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// A preset name, or a path to a TOML file.
    pub fn resolve(spec: &str) -> Result<PipelineConfig> {
        if let Some(config) = preset(spec) {
            return Ok(config);
        }
        let path = Path::new(spec);
        if path.extension().is_some_and(|e| e == "toml") {
            return Self::load(path);
        }
        Err(LutError::Config(format!(
            "'{}' is neither a preset ({}) nor a .toml file",
            spec,
            PRESET_NAMES.join(", ")
        )))
    }

    pub fn format_summary(&self) -> String {
        let axes = crate::lut::domain::NESTING
            .iter()
            .map(|&a| {
                let s = self.axes.get(a);
                format!("{}={}", a, s.steps)
            })
            .collect::<Vec<_>>()
            .join(" ");
        format!(
            "{}: {} S={} ({}){}, {} packing, actions {}, axes {} -> {} entries, {} bytes",
            self.name,
            self.normalization.family(),
            self.scale,
            self.rescale().map_or_else(|_| "invalid".to_string(), |r| r.to_string()),
            if self.narrow_activations { " s16" } else { "" },
            self.packing,
            self.actions,
            axes,
            self.entries(),
            self.table_bytes()
        )
    }
}
