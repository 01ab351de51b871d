//! Half- and quarter-wave plates.

use ndarray::{Array2, array};
use num_complex::Complex64;
use std::fmt;
use std::str::FromStr;

use super::{ComponentId, Routing, SimContext};
use crate::error::{SimError, SimResult};
use crate::photon::{Encoding, Photon};
use crate::state::on_qubit;

/// Retarder type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlateKind {
    /// Half-wave plate.
    Hwp,
    /// Quarter-wave plate.
    Qwp,
}

impl fmt::Display for PlateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlateKind::Hwp => write!(f, "HWP"),
            PlateKind::Qwp => write!(f, "QWP"),
        }
    }
}

impl FromStr for PlateKind {
    type Err = SimError;

    fn from_str(s: &str) -> SimResult<Self> {
        match s.to_ascii_uppercase().as_str() {
            "HWP" => Ok(PlateKind::Hwp),
            "QWP" => Ok(PlateKind::Qwp),
            _ => Err(SimError::Configuration(format!("Invalid wave plate type '{s}'"))),
        }
    }
}

/// Jones matrix of a plate rotated by `theta` radians.
pub fn jones_matrix(kind: PlateKind, theta: f64) -> Array2<Complex64> {
    let re = |v: f64| Complex64::new(v, 0.0);
    match kind {
        PlateKind::Hwp => {
            let (s, c) = (2.0 * theta).sin_cos();
            array![[re(c), re(s)], [re(s), re(-c)]]
        }
        PlateKind::Qwp => {
            let (s, c) = theta.sin_cos();
            let i = Complex64::i();
            let off = (re(1.0) - i) * c * s;
            array![
                [re(c * c) + i * (s * s), off],
                [off, re(s * s) + i * (c * c)]
            ]
        }
    }
}

/// Wave plate acting on polarization qubits.
///
/// The 2×2 unitary and its two-photon embeddings are cached and recomputed
/// whenever the angle changes.
pub struct WavePlate {
    /// Component name.
    pub name: String,
    kind: PlateKind,
    angle: f64,
    encoding: Encoding,
    unitary: Array2<Complex64>,
    unitary_first: Array2<Complex64>,
    unitary_second: Array2<Complex64>,
    pub(crate) receivers: Vec<ComponentId>,
}

impl WavePlate {
    /// Create a polarization wave plate at `angle` radians.
    pub fn new(name: impl Into<String>, kind: PlateKind, angle: f64) -> Self {
        let mut plate = Self {
            name: name.into(),
            kind,
            angle,
            encoding: Encoding::Polarization,
            unitary: Array2::eye(2),
            unitary_first: Array2::eye(4),
            unitary_second: Array2::eye(4),
            receivers: Vec::new(),
        };
        plate.set_angle(angle);
        plate
    }

    /// Accept another encoding instead of polarization.
    pub fn with_encoding(mut self, encoding: Encoding) -> Self {
        self.encoding = encoding;
        self
    }

    /// Plate type.
    pub fn kind(&self) -> PlateKind {
        self.kind
    }

    /// Physical rotation angle in radians.
    pub fn angle(&self) -> f64 {
        self.angle
    }

    /// Cached Jones matrix.
    pub fn unitary(&self) -> &Array2<Complex64> {
        &self.unitary
    }

    /// Rotate the plate and refresh the cached operators.
    pub fn set_angle(&mut self, theta: f64) {
        self.angle = theta;
        self.unitary = jones_matrix(self.kind, theta);
        self.unitary_first = on_qubit(&self.unitary, 0);
        self.unitary_second = on_qubit(&self.unitary, 1);
    }

    pub(crate) fn init(&self) -> SimResult<()> {
        if self.receivers.len() != 1 {
            return Err(SimError::Wiring(format!(
                "wave plate '{}' requires exactly 1 receiver, has {}",
                self.name,
                self.receivers.len()
            )));
        }
        Ok(())
    }

    /// Apply the plate to an arriving photon.
    ///
    /// A rejected photon is released before the error is returned.
    pub(crate) fn receive(&mut self, photon: Photon, ctx: &mut SimContext<'_>) -> SimResult<Routing> {
        match self.transform(&photon, ctx) {
            Ok(next) => Ok(Routing::Forward(next, photon)),
            Err(e) => {
                ctx.release(photon);
                Err(e)
            }
        }
    }

    fn transform(&self, photon: &Photon, ctx: &mut SimContext<'_>) -> SimResult<ComponentId> {
        if photon.encoding != self.encoding {
            return Err(SimError::EncodingMismatch {
                component: self.name.clone(),
                expected: self.encoding,
                found: photon.encoding,
            });
        }

        let ket = ctx.states.ket(photon.state)?;
        let transformed = match ket.len() {
            2 => self.unitary.dot(ket),
            4 => match photon.pair_index()? {
                0 => self.unitary_first.dot(ket),
                _ => self.unitary_second.dot(ket),
            },
            n => return Err(SimError::Dimension(n)),
        };
        ctx.states.set_ket(photon.state, transformed)?;

        self.receivers.first().copied().ok_or_else(|| {
            SimError::Wiring(format!("wave plate '{}' has no receiver", self.name))
        })
    }
}
