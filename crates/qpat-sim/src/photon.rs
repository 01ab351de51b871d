//! Photons in flight.

use std::fmt;
use std::str::FromStr;

use crate::error::{SimError, SimResult};
use crate::state::StateKey;

/// Qubit encoding carried by a photon.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Encoding {
    /// Polarization qubit (H/V).
    #[default]
    Polarization,
    /// Time-bin qubit (early/late).
    TimeBin,
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Encoding::Polarization => write!(f, "polarization"),
            Encoding::TimeBin => write!(f, "time_bin"),
        }
    }
}

impl FromStr for Encoding {
    type Err = SimError;

    fn from_str(s: &str) -> SimResult<Self> {
        match s.to_ascii_lowercase().as_str() {
            "polarization" => Ok(Encoding::Polarization),
            "time_bin" | "timebin" => Ok(Encoding::TimeBin),
            other => Err(SimError::Configuration(format!("unknown encoding '{other}'"))),
        }
    }
}

/// A single photon.
///
/// Photons are moved from component to component; whoever holds one owns
/// it exclusively until it forwards it or releases its state. The name is
/// the pair-role tag: sources create "signal"/"idler" and their output
/// ports rename them "0"/"1".
#[derive(Debug)]
pub struct Photon {
    /// Pair-role tag.
    pub name: String,
    /// Qubit encoding.
    pub encoding: Encoding,
    /// Wavelength in nm.
    pub wavelength: f64,
    /// Ket holding this photon's polarization (shared with its partner).
    pub state: StateKey,
}

impl Photon {
    /// Create a photon referencing an existing ket.
    pub fn new(name: impl Into<String>, encoding: Encoding, wavelength: f64, state: StateKey) -> Self {
        Self {
            name: name.into(),
            encoding,
            wavelength,
            state,
        }
    }

    /// Which tensor factor of a two-photon ket this photon is.
    pub fn pair_index(&self) -> SimResult<usize> {
        match self.name.as_str() {
            "0" => Ok(0),
            "1" => Ok(1),
            _ => Err(SimError::AmbiguousPairRole(self.name.clone())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pair_index() {
        let p = Photon::new("1", Encoding::Polarization, 1550.0, StateKey(0));
        assert_eq!(p.pair_index().unwrap(), 1);

        let p = Photon::new("signal", Encoding::Polarization, 1550.0, StateKey(0));
        assert!(matches!(p.pair_index(), Err(SimError::AmbiguousPairRole(n)) if n == "signal"));
    }

    #[test]
    fn test_encoding_parse() {
        assert_eq!("Polarization".parse::<Encoding>().unwrap(), Encoding::Polarization);
        assert_eq!("time_bin".parse::<Encoding>().unwrap(), Encoding::TimeBin);
        assert!("orbital".parse::<Encoding>().is_err());
    }
}
