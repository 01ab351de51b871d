//! The capability interface.

use std::collections::BTreeMap;

use qpat_experiment::Params;
use serde::{Deserialize, Serialize};

use crate::error::CapabilityResult;

/// Result of one capability run: a headline value plus free-form details.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CapabilityOutcome {
    /// Primary observable (for example a coincidence rate in Hz).
    pub value: f64,
    /// Supporting numbers, keyed by name.
    #[serde(default)]
    pub metadata: BTreeMap<String, serde_json::Value>,
}

impl CapabilityOutcome {
    /// An outcome without metadata.
    pub fn new(value: f64) -> Self {
        Self {
            value,
            metadata: BTreeMap::new(),
        }
    }

    /// Builder-style metadata setter.
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

/// One self-contained experiment that can be run against a topology.
///
/// A capability owns the topology it mutates, so two capabilities never
/// observe each other's parameter changes.
pub trait Capability: Send {
    /// Registry name, as used in workflow steps.
    fn name(&self) -> &str;

    /// Configure, simulate and analyze with the given step parameters.
    fn run(&mut self, params: &Params) -> CapabilityResult<CapabilityOutcome>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_serializes() {
        let outcome = CapabilityOutcome::new(2.5).with_metadata("pulses", 100);
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["value"], 2.5);
        assert_eq!(json["metadata"]["pulses"], 100);
    }
}
