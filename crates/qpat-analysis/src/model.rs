//! The coincidence-model interface and method selection.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::binned::BinnedCoincidenceModel;
use crate::error::{AnalysisError, AnalysisResult};
use crate::window::WindowCoincidenceModel;

/// Detector timestamp in picoseconds.
pub type Timestamp = u64;

/// Picoseconds per second.
///
/// Same unit as the simulator clock (`qpat_sim::kernel::PS_PER_SECOND`), so
/// detector timestamps are correlated without rescaling.
pub const PS_PER_SECOND: f64 = 1e12;

/// Outcome of correlating two timestamp streams.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coincidences {
    /// Number of coincident pairs.
    pub count: u64,
    /// Window (or bin width) used, in picoseconds.
    pub window: Timestamp,
}

/// A strategy for counting coincidences between two detectors.
pub trait CoincidenceModel: Send + Sync {
    /// Short method name.
    fn name(&self) -> &'static str;

    /// Window or bin width in picoseconds.
    fn window(&self) -> Timestamp;

    /// Count coincidences between streams `a` and `b`.
    ///
    /// Inputs need not be sorted.
    fn compute(&self, a: &[Timestamp], b: &[Timestamp]) -> Coincidences;

    /// Coincidence rate in Hz over a measurement of `duration` seconds.
    fn rate(&self, coincidences: &Coincidences, duration: f64) -> AnalysisResult<f64> {
        if !duration.is_finite() || duration <= 0.0 {
            return Err(AnalysisError::InvalidDuration(duration));
        }
        Ok(coincidences.count as f64 / duration)
    }
}

/// Convert a window given in seconds to whole picoseconds.
pub fn window_from_seconds(seconds: f64) -> AnalysisResult<Timestamp> {
    if !seconds.is_finite() || seconds <= 0.0 {
        return Err(AnalysisError::InvalidWindow(format!("{seconds} s")));
    }
    let ps = (seconds * PS_PER_SECOND).round();
    if ps < 1.0 {
        return Err(AnalysisError::InvalidWindow(format!(
            "{seconds} s is below the 1 ps timestamp resolution"
        )));
    }
    Ok(ps as Timestamp)
}

/// Available coincidence-counting strategies.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CoincidenceMethod {
    /// Sliding window around each event.
    #[default]
    Window,
    /// Fixed, non-overlapping time bins.
    Binned,
}

impl CoincidenceMethod {
    /// Instantiate the model with a window in picoseconds.
    pub fn build(self, window: Timestamp) -> AnalysisResult<Box<dyn CoincidenceModel>> {
        Ok(match self {
            CoincidenceMethod::Window => Box::new(WindowCoincidenceModel::new(window)?),
            CoincidenceMethod::Binned => Box::new(BinnedCoincidenceModel::new(window)?),
        })
    }
}

impl FromStr for CoincidenceMethod {
    type Err = AnalysisError;

    fn from_str(s: &str) -> AnalysisResult<Self> {
        match s.to_ascii_lowercase().as_str() {
            "window" | "sliding" => Ok(CoincidenceMethod::Window),
            "binned" | "bin" => Ok(CoincidenceMethod::Binned),
            _ => Err(AnalysisError::UnknownMethod(s.to_string())),
        }
    }
}

impl fmt::Display for CoincidenceMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoincidenceMethod::Window => write!(f, "window"),
            CoincidenceMethod::Binned => write!(f, "binned"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_from_seconds() {
        assert_eq!(window_from_seconds(1e-9).unwrap(), 1_000);
        assert!(window_from_seconds(0.0).is_err());
        assert!(window_from_seconds(1e-15).is_err());
        assert!(window_from_seconds(f64::NAN).is_err());
    }

    #[test]
    fn test_method_parse_and_build() {
        let method: CoincidenceMethod = "Binned".parse().unwrap();
        assert_eq!(method, CoincidenceMethod::Binned);
        assert_eq!(method.build(10).unwrap().name(), "binned");
        assert_eq!(CoincidenceMethod::default().build(10).unwrap().window(), 10);
        assert!("fft".parse::<CoincidenceMethod>().is_err());
    }

    #[test]
    fn test_rate_rejects_bad_duration() {
        let model = CoincidenceMethod::Window.build(5).unwrap();
        let c = Coincidences { count: 10, window: 5 };
        assert_eq!(model.rate(&c, 2.0).unwrap(), 5.0);
        assert_eq!(
            model.rate(&c, 0.0).unwrap_err(),
            AnalysisError::InvalidDuration(0.0)
        );
        assert!(model.rate(&c, -1.0).is_err());
    }
}
