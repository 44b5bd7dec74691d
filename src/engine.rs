//! A configuration and a weight set bound into one decision function.

use tracing::info;

use crate::config::PipelineConfig;
use crate::error::{LutError, Result};
use crate::lut::domain::{QuantizedState, RawState};
use crate::lut::{self, Table};
use crate::net::{ForwardTrace, Network, Normalizer, Weights, INPUTS};
use crate::policy::Policy;

/// Normalizer plus network, checked against each other at construction.
#[derive(Clone, Debug)]
pub struct Engine {
    config: PipelineConfig,
    normalizer: Normalizer,
    network: Network,
    weights_hash: String,
}

impl Engine {
    /// Validate `config` and bind `weights` to it. The weights' scale must be
    /// the scale the configuration evaluates at.
    pub fn new(config: PipelineConfig, weights: Weights) -> Result<Engine> {
        config.validate()?;
        if weights.scale != config.scale {
            return Err(LutError::ScaleMismatch {
                weights: weights.scale,
                config: config.scale,
            });
        }
        let rescale = config.rescale()?;
        let normalizer = config.normalizer()?;
        let weights_hash = weights.hash();
        info!(
            config = %config.name,
            scale = config.scale,
            rescale = %rescale,
            narrow = config.narrow_activations,
            weights = &weights_hash[..12],
            "engine ready"
        );
        let network = Network::new(weights, rescale, config.narrow_activations);
        Ok(Engine {
            config,
            normalizer,
            network,
            weights_hash,
        })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn network(&self) -> &Network {
        &self.network
    }

    pub fn inputs(&self, raw: &RawState) -> Result<[i32; INPUTS]> {
        self.normalizer.normalize(raw)
    }

    /// Every intermediate value for one raw state.
    pub fn trace(&self, raw: &RawState) -> Result<ForwardTrace> {
        self.network.trace(&self.inputs(raw)?)
    }

    /// Decision for a table cell.
    pub fn decide_state(&self, q: &QuantizedState) -> Result<u8> {
        if !self.config.axes.contains(q) {
            return Err(LutError::Config(format!(
                "state {} outside axis steps {:?}",
                q,
                self.config.axes.steps()
            )));
        }
        self.decide(&self.config.axes.raw_state(q))
    }

    /// Tabulate the whole domain.
    pub fn generate(&self, parallel: bool) -> Result<Table> {
        lut::generate(&self.config, self, parallel)
    }
}

impl Policy for Engine {
    #[inline]
    fn decide(&self, raw: &RawState) -> Result<u8> {
        self.network.decide(&self.normalizer.normalize(raw)?)
    }

    fn describe(&self) -> String {
        "network".to_string()
    }

    fn weights_hash(&self) -> Option<String> {
        Some(self.weights_hash.clone())
    }
}
