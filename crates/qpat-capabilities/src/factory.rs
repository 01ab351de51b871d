//! Capability construction by name.

use qpat_analysis::{CoincidenceMethod, window_from_seconds};
use qpat_experiment::Topology;
use qpat_sim::PhotonicTopologyBuilder;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::capability::Capability;
use crate::error::{CapabilityError, CapabilityResult};
use crate::polarization::PolarizationAnalysisCapability;

/// Settings shared by every capability the factory creates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FactoryConfig {
    /// Name of the entangled-pair source node.
    pub source: String,
    /// Name of the first analyzer node.
    pub alice: String,
    /// Name of the second analyzer node.
    pub bob: String,
    /// Coincidence window in seconds.
    pub window: f64,
    /// Coincidence-counting strategy.
    pub method: CoincidenceMethod,
    /// RNG seed; `None` seeds from the OS.
    pub seed: Option<u64>,
}

impl Default for FactoryConfig {
    fn default() -> Self {
        Self {
            source: "Source".into(),
            alice: "Alice".into(),
            bob: "Bob".into(),
            window: 1e-9,
            method: CoincidenceMethod::Window,
            seed: None,
        }
    }
}

/// Builds capabilities bound to a topology.
#[derive(Debug, Clone, Default)]
pub struct CapabilityFactory {
    config: FactoryConfig,
}

impl CapabilityFactory {
    /// Capability names this factory can build.
    pub const AVAILABLE: &'static [&'static str] = &[PolarizationAnalysisCapability::NAME];

    /// Create a factory.
    pub fn new(config: FactoryConfig) -> Self {
        Self { config }
    }

    /// Factory settings.
    pub fn config(&self) -> &FactoryConfig {
        &self.config
    }

    /// Create capability `name` owning `topology`, using the configured seed.
    pub fn create(&self, name: &str, topology: Topology) -> CapabilityResult<Box<dyn Capability>> {
        self.create_seeded(name, topology, self.config.seed)
    }

    /// Create capability `name` with an explicit seed.
    pub fn create_seeded(
        &self,
        name: &str,
        topology: Topology,
        seed: Option<u64>,
    ) -> CapabilityResult<Box<dyn Capability>> {
        let builder = match seed {
            Some(seed) => PhotonicTopologyBuilder::with_seed(seed),
            None => PhotonicTopologyBuilder::new(),
        };
        debug!(name, ?seed, "creating capability");

        match name {
            PolarizationAnalysisCapability::NAME => {
                let model = self
                    .config
                    .method
                    .build(window_from_seconds(self.config.window)?)?;
                Ok(Box::new(PolarizationAnalysisCapability::new(
                    topology,
                    builder,
                    self.config.source.as_str(),
                    self.config.alice.as_str(),
                    self.config.bob.as_str(),
                    model,
                )))
            }
            _ => Err(CapabilityError::UnknownCapability(name.to_string())),
        }
    }
}
