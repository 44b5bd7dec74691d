pub mod config;
pub mod diagnostic;
pub mod emit;
pub mod engine;
pub mod error;
pub mod fixed;
pub mod lut;
pub mod net;
pub mod policy;

// Re-exports for the common path: configuration + weights -> table
pub use config::PipelineConfig;
pub use engine::Engine;
pub use error::{LutError, Result};
pub use lut::domain::{Axes, QuantizedState, RawState};
pub use lut::Table;
pub use net::Weights;
pub use policy::Policy;

/// Resolve a configuration (preset name or `.toml` path) and weights
/// (`builtin:<name>` or JSON path) into an engine.
pub fn load_engine(config: &str, weights: &str) -> Result<Engine> {
    Engine::new(PipelineConfig::resolve(config)?, Weights::resolve(weights)?)
}

/// Generate the table for a configuration and weight set.
pub fn generate_table(config: &str, weights: &str) -> Result<Table> {
    load_engine(config, weights)?.generate(true)
}
