//! Entangled-pair source node.

use qpat_experiment::{Params, ParamsExt};

use crate::components::{BellState, ComponentId, PhotonStatistics, SpdcBellSource};
use crate::error::SimResult;
use crate::photon::Encoding;

/// Source parameters read from a node's parameter map.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceConfig {
    /// Pulse rate in Hz.
    pub frequency: f64,
    /// Mean pairs per pulse.
    pub mean_photon_num: f64,
    /// Pair-number statistics.
    pub photon_statistics: PhotonStatistics,
    /// Emitted Bell state.
    pub bell_state: BellState,
    /// Signal and idler wavelengths (nm).
    pub wavelengths: [f64; 2],
    /// Per-pulse phase-flip probability.
    pub phase_error: f64,
    /// Spectral bandwidth (nm). Carried for reporting; emission ignores it.
    pub bandwidth: f64,
    /// Photon encoding.
    pub encoding: Encoding,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            frequency: 8e7,
            mean_photon_num: 0.1,
            photon_statistics: PhotonStatistics::Thermal,
            bell_state: BellState::PsiPlus,
            wavelengths: [1550.0, 1550.0],
            phase_error: 0.0,
            bandwidth: 0.0,
            encoding: Encoding::Polarization,
        }
    }
}

impl SourceConfig {
    /// Read a config, falling back to defaults for absent keys.
    ///
    /// Unknown keys are ignored. A `wavelengths` entry that is not a pair
    /// falls back to the default pair.
    pub fn from_params(params: &Params) -> SimResult<Self> {
        let defaults = Self::default();
        let wavelengths = match params.get_f64_list("wavelengths")?.as_deref() {
            Some(&[a, b]) => [a, b],
            _ => defaults.wavelengths,
        };
        Ok(Self {
            frequency: params.get_f64("frequency")?.unwrap_or(defaults.frequency),
            mean_photon_num: params
                .get_f64("mean_photon_num")?
                .unwrap_or(defaults.mean_photon_num),
            photon_statistics: match params.get_str("photon_statistics")? {
                Some(s) => s.parse()?,
                None => defaults.photon_statistics,
            },
            bell_state: match params.get_str("bell_state")? {
                Some(s) => s.parse()?,
                None => defaults.bell_state,
            },
            wavelengths,
            phase_error: params.get_f64("phase_error")?.unwrap_or(defaults.phase_error),
            bandwidth: params.get_f64("bandwidth")?.unwrap_or(defaults.bandwidth),
            encoding: match params.get_str("encoding")? {
                Some(s) => s.parse()?,
                None => defaults.encoding,
            },
        })
    }

    /// Instantiate the SPDC component.
    pub fn build(&self, name: impl Into<String>) -> SimResult<SpdcBellSource> {
        Ok(SpdcBellSource::new(
            name,
            self.frequency,
            self.mean_photon_num,
            self.photon_statistics,
            self.bell_state,
        )?
        .with_wavelengths(self.wavelengths)
        .with_phase_error(self.phase_error)?
        .with_encoding(self.encoding))
    }
}

/// An SPDC source with two output ports.
pub struct SourceNode {
    /// Node name.
    pub name: String,
    config: SourceConfig,
    source: ComponentId,
    ports: [ComponentId; 2],
    next_port: usize,
}

impl SourceNode {
    /// Assemble a node from already-created components.
    pub fn new(
        name: impl Into<String>,
        config: SourceConfig,
        source: ComponentId,
        ports: [ComponentId; 2],
    ) -> Self {
        Self {
            name: name.into(),
            config,
            source,
            ports,
            next_port: 0,
        }
    }

    /// Configuration the node was built from.
    pub fn config(&self) -> &SourceConfig {
        &self.config
    }

    /// SPDC component id.
    pub fn source(&self) -> ComponentId {
        self.source
    }

    /// Output port ids.
    pub fn ports(&self) -> [ComponentId; 2] {
        self.ports
    }

    /// Claim the next unused output port, in declaration order.
    pub fn claim_port(&mut self) -> Option<ComponentId> {
        let port = self.ports.get(self.next_port).copied()?;
        self.next_port += 1;
        Some(port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SimError;
    use qpat_experiment::ParamValue;

    #[test]
    fn test_defaults_from_empty_params() {
        assert_eq!(SourceConfig::from_params(&Params::new()).unwrap(), SourceConfig::default());
    }

    #[test]
    fn test_params_override_defaults() {
        let mut params = Params::new();
        params.insert("frequency".into(), ParamValue::from(1e6));
        params.insert("bell_state".into(), ParamValue::from("phi-"));
        params.insert("photon_statistics".into(), ParamValue::from("poisson"));
        params.insert(
            "wavelengths".into(),
            ParamValue::from(vec![ParamValue::from(810.0), ParamValue::from(1550.0)]),
        );
        params.insert("colour".into(), ParamValue::from("blue"));

        let config = SourceConfig::from_params(&params).unwrap();
        assert_eq!(config.frequency, 1e6);
        assert_eq!(config.bell_state, BellState::PhiMinus);
        assert_eq!(config.photon_statistics, PhotonStatistics::Poisson);
        assert_eq!(config.wavelengths, [810.0, 1550.0]);
    }

    #[test]
    fn test_bad_labels_fail_eagerly() {
        let mut params = Params::new();
        params.insert("bell_state".into(), ParamValue::from("chi"));
        assert!(matches!(
            SourceConfig::from_params(&params),
            Err(SimError::UnknownBellState(_))
        ));

        let mut params = Params::new();
        params.insert("photon_statistics".into(), ParamValue::from("sub-poisson"));
        assert!(matches!(
            SourceConfig::from_params(&params),
            Err(SimError::UnknownStatistics(_))
        ));
    }

    #[test]
    fn test_wrong_type_is_rejected() {
        let mut params = Params::new();
        params.insert("frequency".into(), ParamValue::from(true));
        assert!(SourceConfig::from_params(&params).is_err());
    }

    #[test]
    fn test_ports_claimed_in_order() {
        let mut node = SourceNode::new(
            "Source",
            SourceConfig::default(),
            ComponentId(0),
            [ComponentId(1), ComponentId(2)],
        );
        assert_eq!(node.claim_port(), Some(ComponentId(1)));
        assert_eq!(node.claim_port(), Some(ComponentId(2)));
        assert_eq!(node.claim_port(), None);
    }
}
