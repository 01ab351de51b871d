//! Declarative node and link specifications.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{ExperimentError, ExperimentResult};
use crate::params::Params;

/// Semantic role of a node.
///
/// The role decides the internal optical structure the simulation adapter
/// instantiates for the node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeRole {
    /// Entangled photon-pair source.
    Source,
    /// Polarization analyzer (wave plates + fixed-basis detector).
    PolarizationMeasurement,
}

impl NodeRole {
    /// Wire name of the role.
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeRole::Source => "source",
            NodeRole::PolarizationMeasurement => "polarization_measurement",
        }
    }
}

impl fmt::Display for NodeRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Declarative node specification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeSpec {
    /// Unique node name.
    pub name: String,
    /// Semantic role.
    pub role: NodeRole,
    /// Role-specific parameters (frequency, angles, ...).
    #[serde(default)]
    pub params: Params,
}

impl NodeSpec {
    /// Create a node spec with no parameters.
    pub fn new(name: impl Into<String>, role: NodeRole) -> Self {
        Self {
            name: name.into(),
            role,
            params: Params::new(),
        }
    }

    /// Builder-style parameter setter.
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<crate::ParamValue>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }
}

/// Propagation model of a quantum link.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkModel {
    /// Plain fibre: attenuation over distance only.
    #[default]
    Ideal,
    /// Lossy deployed-fibre model with an additional fixed insertion loss.
    Bifrost,
}

/// Quantum link between two nodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuantumLinkSpec {
    /// Emitting node.
    pub src: String,
    /// Receiving node.
    pub dst: String,
    /// Fibre length in meters.
    #[serde(default)]
    pub distance: f64,
    /// Attenuation in dB per meter.
    #[serde(default)]
    pub attenuation: f64,
    /// Propagation model.
    #[serde(default)]
    pub model: LinkModel,
    /// Model-specific parameters.
    #[serde(default)]
    pub model_params: Params,
}

impl QuantumLinkSpec {
    /// Create an ideal zero-length link.
    pub fn new(src: impl Into<String>, dst: impl Into<String>) -> Self {
        Self {
            src: src.into(),
            dst: dst.into(),
            distance: 0.0,
            attenuation: 0.0,
            model: LinkModel::Ideal,
            model_params: Params::new(),
        }
    }

    /// Set the fibre length and attenuation.
    pub fn with_fiber(mut self, distance: f64, attenuation: f64) -> Self {
        self.distance = distance;
        self.attenuation = attenuation;
        self
    }

    /// Check that distance and attenuation are non-negative and finite.
    pub fn validate(&self) -> ExperimentResult<()> {
        for (name, value) in [("distance", self.distance), ("attenuation", self.attenuation)] {
            if !value.is_finite() || value < 0.0 {
                return Err(ExperimentError::InvalidParameter {
                    name: format!("{}->{}.{}", self.src, self.dst, name),
                    reason: format!("must be a non-negative number, got {value}"),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_wire_names() {
        let role: NodeRole = serde_yaml_ng::from_str("polarization_measurement").unwrap();
        assert_eq!(role, NodeRole::PolarizationMeasurement);
        assert_eq!(NodeRole::Source.to_string(), "source");
        assert!(serde_yaml_ng::from_str::<NodeRole>("beam_splitter").is_err());
    }

    #[test]
    fn test_link_defaults() {
        let link: QuantumLinkSpec = serde_yaml_ng::from_str("src: Source\ndst: Alice\n").unwrap();
        assert_eq!(link.distance, 0.0);
        assert_eq!(link.attenuation, 0.0);
        assert_eq!(link.model, LinkModel::Ideal);
        assert!(link.validate().is_ok());
    }

    #[test]
    fn test_negative_distance_rejected() {
        let link = QuantumLinkSpec::new("Source", "Bob").with_fiber(-1.0, 0.0);
        assert!(matches!(
            link.validate(),
            Err(ExperimentError::InvalidParameter { .. })
        ));
    }
}
