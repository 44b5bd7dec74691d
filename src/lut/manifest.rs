//! TOML sidecar describing a table blob.
//!
//! The blob itself has no header. Everything a reader needs to index it
//! (nesting order, axis steps and mappings, packing, action codes) and the
//! hashes that tie it to its weights are recorded next to it in
//! `<stem>.manifest.toml`.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::domain::{Axes, NESTING};
use super::pack::Packing;
use super::write::write_atomic;
use crate::config::PipelineConfig;
use crate::diagnostic::Diagnostic;
use crate::error::{LutError, Result};
use crate::net::ActionOrder;

pub const FORMAT_VERSION: u32 = 1;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    pub format_version: u32,
    pub name: String,
    pub policy: String,
    pub family: String,
    pub scale: i32,
    pub rescale: String,
    pub narrow_activations: bool,
    pub packing: Packing,
    /// Axis names, outermost first.
    pub nesting: Vec<String>,
    pub actions: ActionOrder,
    pub entries: usize,
    pub bytes: usize,
    pub blob_hash: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weights_hash: Option<String>,
    pub axes: Axes,
}

impl Manifest {
    pub fn new(
        config: &PipelineConfig,
        blob: &[u8],
        policy: String,
        weights_hash: Option<String>,
    ) -> Manifest {
        Manifest {
            format_version: FORMAT_VERSION,
            name: config.name.clone(),
            policy,
            family: config.normalization.family().to_string(),
            scale: config.scale,
            rescale: config
                .rescale()
                .map_or_else(|e| e.to_string(), |r| r.to_string()),
            narrow_activations: config.narrow_activations,
            packing: config.packing,
            nesting: NESTING.iter().map(|a| a.name().to_string()).collect(),
            actions: config.actions,
            entries: config.entries(),
            bytes: blob.len(),
            blob_hash: blob_hash(blob),
            weights_hash,
            axes: config.axes,
        }
    }

    /// `ai_lut.bin` -> `ai_lut.manifest.toml`.
    pub fn path_for(blob: &Path) -> PathBuf {
        blob.with_extension("manifest.toml")
    }

    pub fn from_toml(text: &str) -> std::result::Result<Manifest, Diagnostic> {
        toml::from_str(text).map_err(|e| Diagnostic::from_toml(&e))
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| LutError::Config(e.to_string()))
    }

    pub fn load(path: &Path) -> Result<Manifest> {
        let text = std::fs::read_to_string(path).map_err(|e| LutError::io(path, e))?;
        Self::from_toml(&text).map_err(|diagnostic| LutError::Parse {
            path: path.to_path_buf(),
            text: text.clone(),
            diagnostic,
        })
    }

    /// Load the sidecar of `blob` if there is one.
    pub fn load_for(blob: &Path) -> Result<Option<Manifest>> {
        let path = Self::path_for(blob);
        if !path.exists() {
            return Ok(None);
        }
        Self::load(&path).map(Some)
    }

    pub fn write(&self, path: &Path) -> Result<()> {
        write_atomic(path, self.to_toml()?.as_bytes())
    }

    /// Check that a blob and configuration are the ones this manifest describes.
    pub fn check_against(&self, config: &PipelineConfig, blob: &[u8]) -> Result<()> {
        let nesting: Vec<String> = NESTING.iter().map(|a| a.name().to_string()).collect();
        if self.nesting != nesting {
            return Err(mismatch("nesting order", self.nesting.join(","), nesting.join(",")));
        }
        if self.format_version != FORMAT_VERSION {
            return Err(mismatch(
                "format version",
                self.format_version,
                FORMAT_VERSION,
            ));
        }
        if self.packing != config.packing {
            return Err(mismatch("packing", self.packing, config.packing));
        }
        if self.axes.steps() != config.axes.steps() {
            return Err(mismatch(
                "axis steps",
                format!("{:?}", self.axes.steps()),
                format!("{:?}", config.axes.steps()),
            ));
        }
        if self.axes != config.axes {
            return Err(mismatch(
                "axis mapping",
                format!("{:?}", self.axes),
                format!("{:?}", config.axes),
            ));
        }
        if self.actions != config.actions {
            return Err(mismatch("action codes", self.actions, config.actions));
        }
        if self.bytes != blob.len() {
            return Err(mismatch("table length", self.bytes, blob.len()));
        }
        let actual = blob_hash(blob);
        if self.blob_hash != actual {
            return Err(mismatch("blob hash", &self.blob_hash, actual));
        }
        Ok(())
    }

    pub fn format_report(&self) -> String {
        let mut out = format!(
            "{} ({}, {}): {} entries in {} bytes, {} packing\n",
            self.name, self.policy, self.family, self.entries, self.bytes, self.packing
        );
        out.push_str(&format!("  nesting  {}\n", self.nesting.join(" > ")));
        out.push_str(&format!("  actions  {}\n", self.actions));
        out.push_str(&format!("  blob     {}\n", self.blob_hash));
        if let Some(w) = &self.weights_hash {
            out.push_str(&format!("  weights  {}\n", w));
        }
        out
    }
}

pub fn blob_hash(blob: &[u8]) -> String {
    blake3::hash(blob).to_hex().to_string()
}

fn mismatch(what: &'static str, recorded: impl ToString, actual: impl ToString) -> LutError {
    LutError::Manifest {
        what,
        recorded: recorded.to_string(),
        actual: actual.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::preset;

    fn manifest() -> (PipelineConfig, Vec<u8>, Manifest) {
        let config = preset("tile-ratio-v3.1").unwrap();
        let blob = vec![85u8; config.table_bytes()];
        let m = Manifest::new(&config, &blob, "network".into(), Some("ab".repeat(32)));
        (config, blob, m)
    }

    #[test]
    fn sidecar_path() {
        assert_eq!(
            Manifest::path_for(Path::new("out/ai_lut.bin")),
            PathBuf::from("out/ai_lut.manifest.toml")
        );
        assert_eq!(
            Manifest::path_for(Path::new("table")),
            PathBuf::from("table.manifest.toml")
        );
    }

    #[test]
    fn records_layout() {
        let (_, _, m) = manifest();
        assert_eq!(m.nesting, ["ball_x", "ball_y", "ball_vx", "ball_vy", "ai_y"]);
        assert_eq!(m.entries, 108_864);
        assert_eq!(m.bytes, 27_216);
        assert_eq!(m.packing, Packing::TwoBit);
        assert_eq!(m.rescale, ">> 10");
    }

    #[test]
    fn toml_roundtrip() {
        let (_, _, m) = manifest();
        let text = m.to_toml().unwrap();
        assert!(text.contains("packing = \"two-bit\""), "{}", text);
        assert_eq!(Manifest::from_toml(&text).unwrap(), m);
    }

    #[test]
    fn detects_corruption() {
        let (config, mut blob, m) = manifest();
        m.check_against(&config, &blob).unwrap();
        blob[100] ^= 1;
        let err = m.check_against(&config, &blob).unwrap_err();
        assert!(matches!(err, LutError::Manifest { what: "blob hash", .. }));
    }

    #[test]
    fn detects_layout_change() {
        let (config, blob, m) = manifest();
        let mut other = config.clone();
        other.packing = Packing::Byte;
        assert!(matches!(
            m.check_against(&other, &blob),
            Err(LutError::Manifest { what: "packing", .. })
        ));

        let mut reordered = m.clone();
        reordered.nesting.swap(3, 4);
        assert!(matches!(
            reordered.check_against(&config, &blob),
            Err(LutError::Manifest { what: "nesting order", .. })
        ));

        assert!(matches!(
            m.check_against(&config, &blob[1..]),
            Err(LutError::Manifest { what: "table length", .. })
        ));
    }

    #[test]
    fn load_for_missing_sidecar() {
        let dir = tempfile::tempdir().unwrap();
        let blob = dir.path().join("lut.bin");
        assert!(Manifest::load_for(&blob).unwrap().is_none());
        let (_, _, m) = manifest();
        m.write(&Manifest::path_for(&blob)).unwrap();
        assert_eq!(Manifest::load_for(&blob).unwrap(), Some(m));
    }
}
