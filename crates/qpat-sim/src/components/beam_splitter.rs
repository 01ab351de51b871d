//! Fixed-basis polarizing beam splitter.

use tracing::trace;

use super::{ComponentId, Routing, SimContext};
use crate::error::{SimError, SimResult};
use crate::photon::{Encoding, Photon};
use crate::state::{Basis, polarization_basis};

/// Routes each photon to output 0 or 1 by measuring it in a fixed basis.
///
/// With probability `1 - fidelity` the photon is lost inside the splitter;
/// with probability `mismeasure_prob` the routed output is flipped.
pub struct FixedBasisBeamSplitter {
    /// Component name.
    pub name: String,
    basis_index: usize,
    basis: &'static Basis,
    fidelity: f64,
    mismeasure_prob: f64,
    pub(crate) receivers: Vec<ComponentId>,
}

fn check_probability(name: &str, value: f64) -> SimResult<f64> {
    if (0.0..=1.0).contains(&value) {
        Ok(value)
    } else {
        Err(SimError::Configuration(format!(
            "{name} must be in [0, 1], got {value}"
        )))
    }
}

impl FixedBasisBeamSplitter {
    /// Create a splitter measuring in basis `basis_index` (0 = H/V, 1 = diagonal).
    pub fn new(
        name: impl Into<String>,
        basis_index: usize,
        fidelity: f64,
        mismeasure_prob: f64,
    ) -> SimResult<Self> {
        Ok(Self {
            name: name.into(),
            basis_index,
            basis: polarization_basis(basis_index)?,
            fidelity: check_probability("fidelity", fidelity)?,
            mismeasure_prob: check_probability("mismeasure_prob", mismeasure_prob)?,
            receivers: Vec::new(),
        })
    }

    /// Measurement basis index.
    pub fn basis_index(&self) -> usize {
        self.basis_index
    }

    pub(crate) fn init(&self) -> SimResult<()> {
        if self.receivers.len() != 2 {
            return Err(SimError::Wiring(format!(
                "beam splitter '{}' requires exactly 2 receivers, has {}",
                self.name,
                self.receivers.len()
            )));
        }
        Ok(())
    }

    /// Measure an arriving photon and forward it to the matching output.
    ///
    /// Lost and rejected photons are released.
    pub(crate) fn receive(&mut self, photon: Photon, ctx: &mut SimContext<'_>) -> SimResult<Routing> {
        match self.select_output(&photon, ctx) {
            Ok(Some(next)) => Ok(Routing::Forward(next, photon)),
            Ok(None) => {
                ctx.release(photon);
                Ok(Routing::Done)
            }
            Err(e) => {
                ctx.release(photon);
                Err(e)
            }
        }
    }

    fn select_output(&self, photon: &Photon, ctx: &mut SimContext<'_>) -> SimResult<Option<ComponentId>> {
        if photon.encoding != Encoding::Polarization {
            return Err(SimError::EncodingMismatch {
                component: self.name.clone(),
                expected: Encoding::Polarization,
                found: photon.encoding,
            });
        }

        if ctx.uniform() >= self.fidelity {
            trace!(splitter = %self.name, "photon lost in splitter");
            return Ok(None);
        }

        let qubit = match ctx.states.ket(photon.state)?.len() {
            4 => photon.pair_index()?,
            _ => 0,
        };
        let mut outcome = ctx
            .states
            .measure(photon.state, qubit, self.basis, &mut *ctx.rng)?;
        if ctx.uniform() < self.mismeasure_prob {
            outcome ^= 1;
        }

        self.receivers
            .get(usize::from(outcome))
            .copied()
            .map(Some)
            .ok_or_else(|| {
                SimError::Wiring(format!(
                    "beam splitter '{}' has no receiver for output {outcome}",
                    self.name
                ))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::Action;
    use crate::kernel::Timeline;
    use crate::state::{QuantumManager, horizontal};
    use ndarray::array;
    use num_complex::Complex64;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn splitter(fidelity: f64, mismeasure: f64) -> FixedBasisBeamSplitter {
        let mut bs = FixedBasisBeamSplitter::new("bs", 0, fidelity, mismeasure).unwrap();
        bs.receivers = vec![ComponentId(10), ComponentId(11)];
        bs
    }

    fn route(bs: &mut FixedBasisBeamSplitter, vertical: bool, seed: u64) -> Routing {
        let mut tl: Timeline<Action> = Timeline::new();
        let mut rng = StdRng::seed_from_u64(seed);
        let mut qm = QuantumManager::new();
        let ket = if vertical {
            array![Complex64::new(0.0, 0.0), Complex64::new(1.0, 0.0)]
        } else {
            horizontal()
        };
        let key = qm.new_ket(ket, 1).unwrap();
        let mut ctx = SimContext::new(&mut tl, &mut rng, &mut qm);
        bs.receive(Photon::new("0", Encoding::Polarization, 1550.0, key), &mut ctx)
            .unwrap()
    }

    #[test]
    fn test_routes_by_outcome() {
        let mut bs = splitter(1.0, 0.0);
        for seed in 0..10 {
            assert!(matches!(route(&mut bs, false, seed), Routing::Forward(ComponentId(10), _)));
            assert!(matches!(route(&mut bs, true, seed), Routing::Forward(ComponentId(11), _)));
        }
    }

    #[test]
    fn test_mismeasure_flips_output() {
        let mut bs = splitter(1.0, 1.0);
        assert!(matches!(route(&mut bs, false, 3), Routing::Forward(ComponentId(11), _)));
    }

    #[test]
    fn test_zero_fidelity_loses_everything() {
        let mut bs = splitter(0.0, 0.0);
        for seed in 0..10 {
            assert!(matches!(route(&mut bs, false, seed), Routing::Done));
        }
    }

    #[test]
    fn test_rejected_photons_are_released() {
        let mut tl: Timeline<Action> = Timeline::new();
        let mut rng = StdRng::seed_from_u64(0);
        let mut qm = QuantumManager::new();

        let mut bs = splitter(1.0, 0.0);
        let key = qm.new_ket(horizontal(), 1).unwrap();
        let mut ctx = SimContext::new(&mut tl, &mut rng, &mut qm);
        let err = bs
            .receive(Photon::new("0", Encoding::TimeBin, 1550.0, key), &mut ctx)
            .unwrap_err();
        assert!(matches!(err, SimError::EncodingMismatch { .. }));
        assert!(qm.is_empty());

        let mut unwired = FixedBasisBeamSplitter::new("bs", 0, 1.0, 0.0).unwrap();
        let key = qm.new_ket(horizontal(), 1).unwrap();
        let mut ctx = SimContext::new(&mut tl, &mut rng, &mut qm);
        let err = unwired
            .receive(Photon::new("0", Encoding::Polarization, 1550.0, key), &mut ctx)
            .unwrap_err();
        assert!(matches!(err, SimError::Wiring(_)));
        assert!(qm.is_empty());
    }

    #[test]
    fn test_invalid_configuration() {
        assert!(FixedBasisBeamSplitter::new("bs", 2, 1.0, 0.0).is_err());
        assert!(FixedBasisBeamSplitter::new("bs", 0, 1.5, 0.0).is_err());
        assert!(FixedBasisBeamSplitter::new("bs", 0, 1.0, -0.1).is_err());
    }

    #[test]
    fn test_init_requires_two_receivers() {
        let mut bs = FixedBasisBeamSplitter::new("bs", 1, 1.0, 0.0).unwrap();
        bs.receivers.push(ComponentId(0));
        assert!(matches!(bs.init(), Err(SimError::Wiring(_))));
        bs.receivers.push(ComponentId(1));
        assert!(bs.init().is_ok());
    }
}
