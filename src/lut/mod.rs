//! Lookup table precompute: domain, enumeration, packing, artifacts, and
//! verification.

pub mod domain;
pub mod enumerate;
pub mod manifest;
pub mod pack;
pub mod stats;
pub mod verify;
pub mod write;

use std::path::Path;
use std::time::Instant;

use tracing::info;

use crate::config::PipelineConfig;
use crate::error::Result;
use crate::policy::Policy;
use manifest::Manifest;
use stats::Histogram;

/// A generated table: decisions in flat-index order, their packed blob, and
/// the manifest describing the blob.
#[derive(Clone, Debug)]
pub struct Table {
    pub codes: Vec<u8>,
    pub blob: Vec<u8>,
    pub manifest: Manifest,
}

impl Table {
    pub fn histogram(&self) -> Histogram {
        Histogram::of(&self.codes)
    }

    /// Write the blob to `path` and the manifest next to it. Returns the
    /// manifest path.
    pub fn write(&self, path: &Path) -> Result<std::path::PathBuf> {
        write::write_atomic(path, &self.blob)?;
        let manifest_path = Manifest::path_for(path);
        self.manifest.write(&manifest_path)?;
        Ok(manifest_path)
    }
}

/// Tabulate `policy` over the configuration's domain and pack the result.
pub fn generate<P: Policy + ?Sized>(
    config: &PipelineConfig,
    policy: &P,
    parallel: bool,
) -> Result<Table> {
    config.validate()?;
    let start = Instant::now();
    info!(
        name = %config.name,
        policy = %policy.describe(),
        entries = config.entries(),
        parallel,
        "enumerating"
    );
    let codes = if parallel {
        enumerate::enumerate(&config.axes, policy)?
    } else {
        enumerate::enumerate_serial(&config.axes, policy)?
    };
    let blob = pack::pack(&codes, config.packing)?;
    info!(
        bytes = blob.len(),
        packing = %config.packing,
        elapsed_ms = start.elapsed().as_millis() as u64,
        "table packed"
    );
    let manifest = Manifest::new(config, &blob, policy.describe(), policy.weights_hash());
    Ok(Table {
        codes,
        blob,
        manifest,
    })
}
