//! SPDC entangled-pair source and its output ports.

use ndarray::Array1;
use num_complex::Complex64;
use rand_distr::{Distribution, Geometric, Poisson};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

use super::{Action, ComponentId, Routing, SimContext};
use crate::error::{SimError, SimResult};
use crate::kernel::{PS_PER_SECOND, Picoseconds};
use crate::photon::{Encoding, Photon};
use crate::state::Ket;

/// Photon-pair number distribution per pulse.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PhotonStatistics {
    /// Bose-Einstein (geometric) statistics of a single-mode SPDC source.
    #[default]
    Thermal,
    /// Poissonian statistics.
    Poisson,
}

impl FromStr for PhotonStatistics {
    type Err = SimError;

    fn from_str(s: &str) -> SimResult<Self> {
        match s {
            "thermal" => Ok(PhotonStatistics::Thermal),
            "poisson" => Ok(PhotonStatistics::Poisson),
            other => Err(SimError::UnknownStatistics(other.to_string())),
        }
    }
}

impl fmt::Display for PhotonStatistics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PhotonStatistics::Thermal => write!(f, "thermal"),
            PhotonStatistics::Poisson => write!(f, "poisson"),
        }
    }
}

/// Pair-number sampler built once per source.
enum PairSampler {
    Never,
    Thermal(Geometric),
    Poisson(Poisson<f64>),
}

impl PairSampler {
    fn new(statistics: PhotonStatistics, mean_photon_num: f64) -> SimResult<Self> {
        if mean_photon_num == 0.0 {
            return Ok(PairSampler::Never);
        }
        match statistics {
            PhotonStatistics::Thermal => Geometric::new(1.0 / (1.0 + mean_photon_num))
                .map(PairSampler::Thermal)
                .map_err(|e| SimError::Configuration(format!("mean_photon_num: {e}"))),
            PhotonStatistics::Poisson => Poisson::new(mean_photon_num)
                .map(PairSampler::Poisson)
                .map_err(|e| SimError::Configuration(format!("mean_photon_num: {e}"))),
        }
    }

    fn sample(&self, ctx: &mut SimContext<'_>) -> u64 {
        match self {
            PairSampler::Never => 0,
            PairSampler::Thermal(g) => g.sample(&mut *ctx.rng),
            PairSampler::Poisson(p) => p.sample(&mut *ctx.rng) as u64,
        }
    }
}

/// Two-photon polarization Bell states.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BellState {
    /// (|HH⟩ + |VV⟩)/√2
    PhiPlus,
    /// (|HH⟩ − |VV⟩)/√2
    PhiMinus,
    /// (|HV⟩ + |VH⟩)/√2
    #[default]
    PsiPlus,
    /// (|HV⟩ − |VH⟩)/√2
    PsiMinus,
}

impl BellState {
    /// Label as used in configuration files.
    pub fn as_str(&self) -> &'static str {
        match self {
            BellState::PhiPlus => "phi+",
            BellState::PhiMinus => "phi-",
            BellState::PsiPlus => "psi+",
            BellState::PsiMinus => "psi-",
        }
    }

    /// Amplitudes in the `|q0 q1⟩` ordering HH, HV, VH, VV.
    pub fn amplitudes(&self) -> Ket {
        let h = std::f64::consts::FRAC_1_SQRT_2;
        let v = match self {
            BellState::PhiPlus => [h, 0.0, 0.0, h],
            BellState::PhiMinus => [h, 0.0, 0.0, -h],
            BellState::PsiPlus => [0.0, h, h, 0.0],
            BellState::PsiMinus => [0.0, h, -h, 0.0],
        };
        Array1::from_iter(v.into_iter().map(|a| Complex64::new(a, 0.0)))
    }
}

impl FromStr for BellState {
    type Err = SimError;

    fn from_str(s: &str) -> SimResult<Self> {
        match s {
            "phi+" => Ok(BellState::PhiPlus),
            "phi-" => Ok(BellState::PhiMinus),
            "psi+" => Ok(BellState::PsiPlus),
            "psi-" => Ok(BellState::PsiMinus),
            other => Err(SimError::UnknownBellState(other.to_string())),
        }
    }
}

impl fmt::Display for BellState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Spontaneous parametric down-conversion source of polarization Bell pairs.
pub struct SpdcBellSource {
    /// Component name.
    pub name: String,
    frequency: f64,
    mean_photon_num: f64,
    statistics: PhotonStatistics,
    sampler: PairSampler,
    bell_state: BellState,
    wavelengths: [f64; 2],
    phase_error: f64,
    encoding: Encoding,
    pub(crate) receivers: Vec<ComponentId>,
    pulses_emitted: u64,
    pairs_emitted: u64,
}

impl SpdcBellSource {
    /// Create a source with the default wavelengths and no phase error.
    pub fn new(
        name: impl Into<String>,
        frequency: f64,
        mean_photon_num: f64,
        statistics: PhotonStatistics,
        bell_state: BellState,
    ) -> SimResult<Self> {
        if !frequency.is_finite() || frequency <= 0.0 {
            return Err(SimError::Configuration(format!(
                "frequency must be positive, got {frequency}"
            )));
        }
        if !mean_photon_num.is_finite() || mean_photon_num < 0.0 {
            return Err(SimError::Configuration(format!(
                "mean_photon_num must be non-negative, got {mean_photon_num}"
            )));
        }
        Ok(Self {
            name: name.into(),
            frequency,
            mean_photon_num,
            statistics,
            sampler: PairSampler::new(statistics, mean_photon_num)?,
            bell_state,
            wavelengths: [1550.0, 1550.0],
            phase_error: 0.0,
            encoding: Encoding::Polarization,
            receivers: Vec::new(),
            pulses_emitted: 0,
            pairs_emitted: 0,
        })
    }

    /// Set the signal and idler wavelengths (nm).
    pub fn with_wavelengths(mut self, wavelengths: [f64; 2]) -> Self {
        self.wavelengths = wavelengths;
        self
    }

    /// Set the per-pulse probability of a phase flip on the idler.
    pub fn with_phase_error(mut self, phase_error: f64) -> SimResult<Self> {
        if !(0.0..=1.0).contains(&phase_error) {
            return Err(SimError::Configuration(format!(
                "phase_error must be in [0, 1], got {phase_error}"
            )));
        }
        self.phase_error = phase_error;
        Ok(self)
    }

    /// Set the photon encoding.
    pub fn with_encoding(mut self, encoding: Encoding) -> Self {
        self.encoding = encoding;
        self
    }

    /// Pulse rate in Hz.
    pub fn frequency(&self) -> f64 {
        self.frequency
    }

    /// Mean pairs per pulse.
    pub fn mean_photon_num(&self) -> f64 {
        self.mean_photon_num
    }

    /// Pair-number statistics.
    pub fn statistics(&self) -> PhotonStatistics {
        self.statistics
    }

    /// Emitted Bell state.
    pub fn bell_state(&self) -> BellState {
        self.bell_state
    }

    /// Pulses fired so far.
    pub fn pulses_emitted(&self) -> u64 {
        self.pulses_emitted
    }

    /// Pairs created so far.
    pub fn pairs_emitted(&self) -> u64 {
        self.pairs_emitted
    }

    /// Time between pulses.
    pub fn period(&self) -> Picoseconds {
        (PS_PER_SECOND / self.frequency).round() as Picoseconds
    }

    pub(crate) fn init(&self) -> SimResult<()> {
        if self.receivers.len() != 2 {
            return Err(SimError::Wiring(format!(
                "SPDC source '{}' must connect to 2 receivers, has {}",
                self.name,
                self.receivers.len()
            )));
        }
        Ok(())
    }

    /// Fire `num_pulses` pulses starting now, one period apart.
    ///
    /// Each pulse yields a sampled number of pairs; every pair shares one
    /// Bell-state ket and its photons are scheduled for delivery to output
    /// 0 ("signal") and output 1 ("idler") at the pulse time.
    pub fn emit(&mut self, num_pulses: u64, ctx: &mut SimContext<'_>) -> SimResult<()> {
        let (signal_port, idler_port) = match self.receivers.as_slice() {
            [a, b] => (*a, *b),
            _ => {
                return Err(SimError::Wiring(format!(
                    "SPDC source '{}' must connect to 2 receivers",
                    self.name
                )));
            }
        };

        let period = self.period();
        let mut time = ctx.now();
        let mut pairs = 0u64;
        for _ in 0..num_pulses {
            let mut amplitudes = self.bell_state.amplitudes();
            if self.phase_error > 0.0 && ctx.uniform() < self.phase_error {
                // Z on the idler: I ⊗ Z flips the sign of its |V⟩ components.
                amplitudes[1] = -amplitudes[1];
                amplitudes[3] = -amplitudes[3];
            }

            for _ in 0..self.sampler.sample(ctx) {
                let key = ctx.states.new_ket(amplitudes.clone(), 2)?;
                let signal = Photon::new("signal", self.encoding, self.wavelengths[0], key);
                let idler = Photon::new("idler", self.encoding, self.wavelengths[1], key);
                ctx.timeline.schedule(
                    time,
                    Action::Deliver {
                        to: signal_port,
                        photon: signal,
                    },
                )?;
                ctx.timeline.schedule(
                    time,
                    Action::Deliver {
                        to: idler_port,
                        photon: idler,
                    },
                )?;
                pairs += 1;
            }
            time = time.saturating_add(period);
        }

        self.pulses_emitted += num_pulses;
        self.pairs_emitted += pairs;
        debug!(
            source = %self.name,
            pulses = num_pulses,
            pairs,
            "SPDC emission scheduled"
        );
        Ok(())
    }
}

/// Output port of a source node.
///
/// Renames each photon to the port's pair index and forwards it into the
/// attached channel. Sends through port "0" are logged as emissions.
pub struct SourcePort {
    /// Port name, "0" or "1".
    pub name: String,
    pub(crate) receivers: Vec<ComponentId>,
    sent_times: Vec<Picoseconds>,
}

impl SourcePort {
    /// Create port number `index`.
    pub fn new(index: usize) -> Self {
        Self {
            name: index.to_string(),
            receivers: Vec::new(),
            sent_times: Vec::new(),
        }
    }

    /// Whether a channel is attached.
    pub fn is_connected(&self) -> bool {
        !self.receivers.is_empty()
    }

    /// Times at which photons passed through this port.
    pub fn sent_times(&self) -> &[Picoseconds] {
        &self.sent_times
    }

    pub(crate) fn receive(&mut self, mut photon: Photon, ctx: &mut SimContext<'_>) -> Routing {
        photon.name.clone_from(&self.name);
        self.sent_times.push(ctx.now());
        match self.receivers.first() {
            Some(&next) => Routing::Forward(next, photon),
            None => {
                ctx.release(photon);
                Routing::Done
            }
        }
    }
}
