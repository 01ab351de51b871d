//! Polarization analyzer node: QWP → HWP → fixed-basis polarization detector.

use qpat_experiment::{Params, ParamsExt};
use std::fmt;
use std::str::FromStr;

use crate::components::{ComponentId, DetectorConfig};
use crate::error::{SimError, SimResult};

/// Pauli measurement-basis presets.
///
/// Angles are physical plate angles applied in front of an H/V splitter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalyzerBasis {
    /// H/V: QWP 0°, HWP 0°.
    Z,
    /// D/A: QWP 0°, HWP 22.5°.
    X,
    /// R/L: QWP 45°, HWP 0°.
    Y,
}

impl AnalyzerBasis {
    /// `(qwp, hwp)` angles in radians.
    pub fn angles(&self) -> (f64, f64) {
        match self {
            AnalyzerBasis::Z => (0.0, 0.0),
            AnalyzerBasis::X => (0.0, 22.5_f64.to_radians()),
            AnalyzerBasis::Y => (45.0_f64.to_radians(), 0.0),
        }
    }
}

impl FromStr for AnalyzerBasis {
    type Err = SimError;

    fn from_str(s: &str) -> SimResult<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "Z" => Ok(AnalyzerBasis::Z),
            "X" => Ok(AnalyzerBasis::X),
            "Y" => Ok(AnalyzerBasis::Y),
            _ => Err(SimError::UnknownBasis(s.to_string())),
        }
    }
}

impl fmt::Display for AnalyzerBasis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnalyzerBasis::Z => write!(f, "Z"),
            AnalyzerBasis::X => write!(f, "X"),
            AnalyzerBasis::Y => write!(f, "Y"),
        }
    }
}

/// Analyzer parameters read from a node's parameter map.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalyzerConfig {
    /// Initial QWP angle (rad).
    pub qwp_angle: f64,
    /// Initial HWP angle (rad).
    pub hwp_angle: f64,
    /// Basis preset the initial angles came from, if any.
    pub basis: Option<AnalyzerBasis>,
    /// Splitter basis: 0 = H/V, 1 = diagonal.
    pub basis_index: usize,
    /// Probability the splitter measures instead of losing the photon.
    pub fidelity: f64,
    /// Probability the splitter routes to the wrong output.
    pub mismeasure_prob: f64,
    /// Parameters shared by both detectors.
    pub detector: DetectorConfig,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            qwp_angle: 0.0,
            hwp_angle: 0.0,
            basis: None,
            basis_index: 0,
            fidelity: 1.0,
            mismeasure_prob: 0.0,
            detector: DetectorConfig::default(),
        }
    }
}

fn non_negative_integer(name: &str, value: f64) -> SimResult<u64> {
    if !value.is_finite() || value < 0.0 || value.fract() != 0.0 {
        return Err(SimError::Configuration(format!(
            "{name} must be a non-negative integer, got {value}"
        )));
    }
    Ok(value as u64)
}

impl AnalyzerConfig {
    /// Read a config, falling back to defaults for absent keys.
    ///
    /// A `basis` preset sets both plate angles; explicit `qwp_angle` or
    /// `hwp_angle` entries take precedence over it.
    pub fn from_params(params: &Params) -> SimResult<Self> {
        let defaults = Self::default();
        let basis = params
            .get_str("basis")?
            .map(str::parse::<AnalyzerBasis>)
            .transpose()?;
        let (preset_qwp, preset_hwp) = basis.map_or((0.0, 0.0), |b| b.angles());

        let detector = DetectorConfig {
            efficiency: params
                .get_f64("efficiency")?
                .unwrap_or(defaults.detector.efficiency),
            dark_count: params
                .get_f64("dark_count")?
                .unwrap_or(defaults.detector.dark_count),
            count_rate: params
                .get_f64("count_rate")?
                .unwrap_or(defaults.detector.count_rate),
            time_resolution: match params.get_f64("time_resolution")? {
                Some(v) => non_negative_integer("time_resolution", v)?,
                None => defaults.detector.time_resolution,
            },
        };
        detector.validate()?;

        Ok(Self {
            qwp_angle: params.get_f64("qwp_angle")?.unwrap_or(preset_qwp),
            hwp_angle: params.get_f64("hwp_angle")?.unwrap_or(preset_hwp),
            basis,
            basis_index: match params.get_f64("basis_index")? {
                Some(v) => non_negative_integer("basis_index", v)? as usize,
                None => defaults.basis_index,
            },
            fidelity: params.get_f64("fidelity")?.unwrap_or(defaults.fidelity),
            mismeasure_prob: params
                .get_f64("mismeasure_prob")?
                .unwrap_or(defaults.mismeasure_prob),
            detector,
        })
    }
}

/// A polarization analyzer node.
pub struct PolarizationAnalyzer {
    /// Node name.
    pub name: String,
    config: AnalyzerConfig,
    qwp: ComponentId,
    hwp: ComponentId,
    detector: ComponentId,
}

impl PolarizationAnalyzer {
    /// Assemble a node from already-wired components.
    pub fn new(
        name: impl Into<String>,
        config: AnalyzerConfig,
        qwp: ComponentId,
        hwp: ComponentId,
        detector: ComponentId,
    ) -> Self {
        Self {
            name: name.into(),
            config,
            qwp,
            hwp,
            detector,
        }
    }

    /// Configuration the node was built from.
    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    /// Component that receives incoming photons.
    pub fn entry(&self) -> ComponentId {
        self.qwp
    }

    /// Quarter-wave plate id.
    pub fn qwp(&self) -> ComponentId {
        self.qwp
    }

    /// Half-wave plate id.
    pub fn hwp(&self) -> ComponentId {
        self.hwp
    }

    /// Polarization detector id.
    pub fn detector(&self) -> ComponentId {
        self.detector
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use qpat_experiment::ParamValue;
    use std::f64::consts::{FRAC_PI_4, FRAC_PI_8};

    #[test]
    fn test_basis_presets() {
        assert_eq!("z".parse::<AnalyzerBasis>().unwrap().angles(), (0.0, 0.0));
        let (q, h) = "X".parse::<AnalyzerBasis>().unwrap().angles();
        assert_eq!(q, 0.0);
        assert!((h - FRAC_PI_8).abs() < 1e-15);
        let (q, h) = "Y".parse::<AnalyzerBasis>().unwrap().angles();
        assert!((q - FRAC_PI_4).abs() < 1e-15);
        assert_eq!(h, 0.0);
    }

    #[test]
    fn test_unknown_basis_message() {
        let err = "W".parse::<AnalyzerBasis>().unwrap_err();
        assert_eq!(err.to_string(), "Unknown basis 'W'. Use 'Z', 'X', or 'Y'.");
    }

    #[test]
    fn test_config_defaults() {
        let config = AnalyzerConfig::from_params(&Params::new()).unwrap();
        assert_eq!(config, AnalyzerConfig::default());
    }

    #[test]
    fn test_explicit_angle_beats_preset() {
        let mut params = Params::new();
        params.insert("basis".into(), ParamValue::from("Y"));
        params.insert("hwp_angle".into(), ParamValue::from(0.3));
        let config = AnalyzerConfig::from_params(&params).unwrap();
        assert!((config.qwp_angle - FRAC_PI_4).abs() < 1e-15);
        assert_eq!(config.hwp_angle, 0.3);
        assert_eq!(config.basis, Some(AnalyzerBasis::Y));
    }

    #[test]
    fn test_detector_params() {
        let mut params = Params::new();
        params.insert("efficiency".into(), ParamValue::from(0.5));
        params.insert("dark_count".into(), ParamValue::from(0.0));
        params.insert("time_resolution".into(), ParamValue::from(10.0));
        let config = AnalyzerConfig::from_params(&params).unwrap();
        assert_eq!(config.detector.efficiency, 0.5);
        assert_eq!(config.detector.dark_count, 0.0);
        assert_eq!(config.detector.time_resolution, 10);

        params.insert("time_resolution".into(), ParamValue::from(1.5));
        assert!(AnalyzerConfig::from_params(&params).is_err());
    }
}
