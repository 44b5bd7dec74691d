//! Cross-check a table blob against the policy it was generated from.
//!
//! Indices are recomputed from axis tuples with the nesting formula and
//! entries are read back the way the target reads them, so a disagreement
//! in nesting order, packing or normalization shows up as a mismatch.

use std::path::Path;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use tracing::{info, warn};

use super::domain::QuantizedState;
use super::manifest::Manifest;
use super::pack::unpack_at;
use crate::config::PipelineConfig;
use crate::error::{LutError, Result};
use crate::policy::Policy;

/// Mismatches listed in a report before the rest are summarized.
const REPORT_LIMIT: usize = 20;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Sampling {
    /// `samples` uniformly random tuples from a seeded generator.
    Random { samples: usize, seed: u64 },
    /// Every index.
    Exhaustive,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Mismatch {
    pub state: QuantizedState,
    pub index: usize,
    pub stored: u8,
    pub expected: u8,
}

#[derive(Clone, Debug)]
pub struct VerifyReport {
    pub name: String,
    pub checked: usize,
    pub mismatches: Vec<Mismatch>,
    /// Set when a manifest was found and agreed with the blob.
    pub manifest_checked: bool,
}

impl VerifyReport {
    pub fn is_ok(&self) -> bool {
        self.mismatches.is_empty()
    }

    /// `Err(Verification)` if anything differed.
    pub fn into_result(self) -> Result<VerifyReport> {
        if self.is_ok() {
            Ok(self)
        } else {
            Err(LutError::Verification {
                checked: self.checked,
                mismatches: self.mismatches.len(),
            })
        }
    }

    pub fn format_report(&self) -> String {
        let mut out = format!(
            "{}: checked {} entries, {} mismatches{}\n",
            self.name,
            self.checked,
            self.mismatches.len(),
            if self.manifest_checked {
                ", manifest OK"
            } else {
                ""
            }
        );
        for m in self.mismatches.iter().take(REPORT_LIMIT) {
            out.push_str(&format!(
                "  {} index {}: stored {}, expected {}\n",
                m.state, m.index, m.stored, m.expected
            ));
        }
        if self.mismatches.len() > REPORT_LIMIT {
            out.push_str(&format!(
                "  ... and {} more\n",
                self.mismatches.len() - REPORT_LIMIT
            ));
        }
        out
    }
}

/// Verify an in-memory blob.
pub fn verify<P: Policy + ?Sized>(
    config: &PipelineConfig,
    blob: &[u8],
    policy: &P,
    sampling: Sampling,
) -> Result<VerifyReport> {
    let expected_len = config.table_bytes();
    if blob.len() != expected_len {
        return Err(LutError::Length {
            expected: expected_len,
            found: blob.len(),
        });
    }

    let axes = &config.axes;
    let check = |q: QuantizedState| -> Result<Option<Mismatch>> {
        let Some(index) = axes.flat_index(&q) else {
            return Ok(None);
        };
        let stored = unpack_at(blob, index, config.packing).ok_or(LutError::Length {
            expected: expected_len,
            found: blob.len(),
        })?;
        let expected = policy.decide(&axes.raw_state(&q))?;
        Ok((stored != expected).then_some(Mismatch {
            state: q,
            index,
            stored,
            expected,
        }))
    };

    let (checked, mismatches) = match sampling {
        Sampling::Random { samples, seed } => {
            let mut rng = StdRng::seed_from_u64(seed);
            let steps = axes.steps();
            let mut mismatches = Vec::new();
            for _ in 0..samples {
                let q = QuantizedState::from_array(steps.map(|s| rng.gen_range(0..s)));
                if let Some(m) = check(q)? {
                    mismatches.push(m);
                }
            }
            (samples, mismatches)
        }
        Sampling::Exhaustive => {
            let entries = axes.entries();
            let mismatches = (0..entries)
                .into_par_iter()
                .filter_map(|i| axes.decode(i).map(&check).and_then(Result::transpose))
                .collect::<Result<Vec<Mismatch>>>()?;
            (entries, mismatches)
        }
    };

    if !mismatches.is_empty() {
        warn!(name = %config.name, checked, mismatches = mismatches.len(), "table disagrees with policy");
    }
    Ok(VerifyReport {
        name: config.name.clone(),
        checked,
        mismatches,
        manifest_checked: false,
    })
}

/// Read a blob from disk, check its manifest sidecar if present, then verify
/// its entries.
pub fn verify_file<P: Policy + ?Sized>(
    config: &PipelineConfig,
    path: &Path,
    policy: &P,
    sampling: Sampling,
) -> Result<VerifyReport> {
    let blob = std::fs::read(path).map_err(|e| LutError::io(path, e))?;
    let manifest = Manifest::load_for(path)?;
    if let Some(m) = &manifest {
        m.check_against(config, &blob)?;
        if let (Some(recorded), Some(actual)) = (&m.weights_hash, policy.weights_hash()) {
            if *recorded != actual {
                return Err(LutError::Manifest {
                    what: "weights hash",
                    recorded: recorded.clone(),
                    actual,
                });
            }
        }
        info!(manifest = %Manifest::path_for(path).display(), "manifest agrees with blob");
    }
    let mut report = verify(config, &blob, policy, sampling)?;
    report.manifest_checked = manifest.is_some();
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::preset;
    use crate::lut::generate;
    use crate::net::ActionOrder;
    use crate::policy::Predictive;

    fn table() -> (PipelineConfig, Predictive, Vec<u8>) {
        let config = preset("tile-ratio-v3.1").unwrap();
        let policy = Predictive::new(config.actions);
        let blob = generate(&config, &policy, true).unwrap().blob;
        (config, policy, blob)
    }

    #[test]
    fn clean_table_passes_both_modes() {
        let (config, policy, blob) = table();
        let sampled = verify(&config, &blob, &policy, Sampling::Random { samples: 500, seed: 7 }).unwrap();
        assert!(sampled.is_ok());
        assert_eq!(sampled.checked, 500);
        let full = verify(&config, &blob, &policy, Sampling::Exhaustive).unwrap();
        assert!(full.is_ok());
        assert_eq!(full.checked, 108_864);
    }

    #[test]
    fn flipped_entry_is_reported() {
        let (config, policy, mut blob) = table();
        // entry 0 sits in bits 7..6 of byte 0
        blob[0] ^= 0b1100_0000;
        let report = verify(&config, &blob, &policy, Sampling::Exhaustive).unwrap();
        assert_eq!(report.mismatches.len(), 1);
        let m = report.mismatches[0];
        assert_eq!(m.index, 0);
        assert_eq!(m.state, QuantizedState::default());
        assert_ne!(m.stored, m.expected);
        assert!(report.format_report().contains("index 0"));
        assert!(matches!(
            report.into_result(),
            Err(LutError::Verification { mismatches: 1, .. })
        ));
    }

    #[test]
    fn wrong_action_order_is_caught() {
        let (config, _, blob) = table();
        let other = Predictive::new(ActionOrder::UP_STAY_DOWN);
        let report = verify(&config, &blob, &other, Sampling::Random { samples: 200, seed: 1 }).unwrap();
        assert!(!report.is_ok());
    }

    #[test]
    fn sampling_is_reproducible() {
        let (config, policy, mut blob) = table();
        for b in blob.iter_mut().step_by(3) {
            *b = !*b;
        }
        let run = |seed| {
            verify(&config, &blob, &policy, Sampling::Random { samples: 300, seed })
                .unwrap()
                .mismatches
        };
        assert_eq!(run(42), run(42));
    }

    #[test]
    fn short_blob_is_a_length_error() {
        let (config, policy, blob) = table();
        let err = verify(&config, &blob[..blob.len() - 1], &policy, Sampling::Exhaustive).unwrap_err();
        assert!(matches!(err, LutError::Length { expected: 27_216, found: 27_215 }));
    }
}
