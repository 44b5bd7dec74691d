pub mod dump_weights;
pub mod eval;
pub mod generate;
pub mod presets;
pub mod verify;

use std::path::Path;
use std::process;

use clap::ValueEnum;

use paddle_lut::config::PipelineConfig;
use paddle_lut::engine::Engine;
use paddle_lut::error::LutError;
use paddle_lut::net::Weights;
use paddle_lut::policy::{Policy, Predictive};

/// Which decision function fills the table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum PolicyKind {
    /// Quantized network (needs --weights)
    Network,
    /// Analytic intercept tracker
    Predictive,
}

/// Print the error the way the rest of the CLI does and exit 1.
pub fn fail(err: LutError) -> ! {
    err.report();
    process::exit(1);
}

pub fn load_config(spec: &str) -> PipelineConfig {
    match PipelineConfig::resolve(spec) {
        Ok(config) => match config.validate() {
            Ok(()) => config,
            Err(e) => fail(e),
        },
        Err(e) => fail(e),
    }
}

pub fn load_weights(spec: &str) -> Weights {
    Weights::resolve(spec).unwrap_or_else(|e| fail(e))
}

pub fn build_engine(config: &PipelineConfig, weights: &str) -> Engine {
    Engine::new(config.clone(), load_weights(weights)).unwrap_or_else(|e| fail(e))
}

pub fn build_policy(config: &PipelineConfig, kind: PolicyKind, weights: &str) -> Box<dyn Policy> {
    match kind {
        PolicyKind::Network => Box::new(build_engine(config, weights)),
        PolicyKind::Predictive => Box::new(Predictive::new(config.actions)),
    }
}

/// Write a generated text artifact, or print it when no path is given.
pub fn write_text(path: Option<&Path>, text: &str) {
    match path {
        Some(p) => {
            if let Err(e) = paddle_lut::lut::write::write_atomic(p, text.as_bytes()) {
                fail(e);
            }
            eprintln!("Wrote {}", p.display());
        }
        None => print!("{}", text),
    }
}

/// Upper-cased include guard from a file name: `ai_lut.h` -> `AI_LUT_H`.
pub fn include_guard(path: &Path, fallback: &str) -> String {
    path.file_name()
        .map(|n| {
            n.to_string_lossy()
                .chars()
                .map(|c| {
                    if c.is_ascii_alphanumeric() {
                        c.to_ascii_uppercase()
                    } else {
                        '_'
                    }
                })
                .collect()
        })
        .unwrap_or_else(|| fallback.to_string())
}
