//! Polarization state vectors and projective measurement.
//!
//! Kets live in a [`QuantumManager`] rather than inside photons, because the
//! two photons of an entangled pair share one 4-component ket: a wave plate
//! acting on one member must be visible to the other. Each entry counts its
//! holders and is freed when the last photon referencing it leaves the
//! simulation.
//!
//! Two-photon kets are ordered `|q0 q1⟩`, so qubit 0 is the first tensor
//! factor (`U ⊗ I` acts on it).

use ndarray::linalg::kron;
use ndarray::{Array1, Array2, array};
use num_complex::Complex64;
use rand::Rng;
use rustc_hash::FxHashMap;

use crate::error::{SimError, SimResult};

/// A polarization state vector of length 2 or 4.
pub type Ket = Array1<Complex64>;

/// Handle to a ket in the [`QuantumManager`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StateKey(pub u64);

/// Orthonormal measurement basis for one polarization qubit.
pub type Basis = [[Complex64; 2]; 2];

const SQRT_HALF: f64 = std::f64::consts::FRAC_1_SQRT_2;

/// Polarization measurement bases: 0 = H/V, 1 = diagonal (+/-).
pub const POLARIZATION_BASES: [Basis; 2] = [
    [
        [Complex64::new(1.0, 0.0), Complex64::new(0.0, 0.0)],
        [Complex64::new(0.0, 0.0), Complex64::new(1.0, 0.0)],
    ],
    [
        [Complex64::new(SQRT_HALF, 0.0), Complex64::new(SQRT_HALF, 0.0)],
        [Complex64::new(-SQRT_HALF, 0.0), Complex64::new(SQRT_HALF, 0.0)],
    ],
];

/// Look up a polarization basis by index.
pub fn polarization_basis(index: usize) -> SimResult<&'static Basis> {
    POLARIZATION_BASES.get(index).ok_or_else(|| {
        SimError::Configuration(format!(
            "basis_index must be 0 (H/V) or 1 (diagonal), got {index}"
        ))
    })
}

fn check_dimension(len: usize) -> SimResult<()> {
    match len {
        2 | 4 => Ok(()),
        n => Err(SimError::Dimension(n)),
    }
}

/// Projector `|b⟩⟨b|` onto one basis vector.
fn projector(vector: &[Complex64; 2]) -> Array2<Complex64> {
    Array2::from_shape_fn((2, 2), |(i, j)| vector[i] * vector[j].conj())
}

/// Embed a single-qubit operator into the two-qubit space.
pub fn on_qubit(op: &Array2<Complex64>, qubit: usize) -> Array2<Complex64> {
    let identity: Array2<Complex64> = Array2::eye(2);
    if qubit == 0 {
        kron(op, &identity)
    } else {
        kron(&identity, op)
    }
}

struct StateEntry {
    ket: Ket,
    holders: u8,
}

/// Store of live polarization kets.
#[derive(Default)]
pub struct QuantumManager {
    states: FxHashMap<StateKey, StateEntry>,
    next_key: u64,
}

impl QuantumManager {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a ket held by `holders` photons.
    pub fn new_ket(&mut self, amplitudes: Ket, holders: u8) -> SimResult<StateKey> {
        check_dimension(amplitudes.len())?;
        let key = StateKey(self.next_key);
        self.next_key += 1;
        self.states.insert(
            key,
            StateEntry {
                ket: amplitudes,
                holders: holders.max(1),
            },
        );
        Ok(key)
    }

    /// Read a ket.
    pub fn ket(&self, key: StateKey) -> SimResult<&Ket> {
        self.states
            .get(&key)
            .map(|e| &e.ket)
            .ok_or(SimError::StateNotFound(key.0))
    }

    /// Replace a ket in place; the dimension must not change.
    pub fn set_ket(&mut self, key: StateKey, amplitudes: Ket) -> SimResult<()> {
        let entry = self
            .states
            .get_mut(&key)
            .ok_or(SimError::StateNotFound(key.0))?;
        if amplitudes.len() != entry.ket.len() {
            return Err(SimError::Dimension(amplitudes.len()));
        }
        entry.ket = amplitudes;
        Ok(())
    }

    /// Drop one holder; the entry is removed when none remain.
    pub fn release(&mut self, key: StateKey) {
        if let Some(entry) = self.states.get_mut(&key) {
            entry.holders = entry.holders.saturating_sub(1);
            if entry.holders == 0 {
                self.states.remove(&key);
            }
        }
    }

    /// Number of live kets.
    pub fn len(&self) -> usize {
        self.states.len()
    }

    /// Whether no kets are live.
    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Projective measurement of one qubit in `basis`, collapsing the ket.
    ///
    /// `qubit` selects the tensor factor of a 4-component ket and is ignored
    /// for single-photon kets. Returns the outcome index (0 or 1).
    pub fn measure<R: Rng + ?Sized>(
        &mut self,
        key: StateKey,
        qubit: usize,
        basis: &Basis,
        rng: &mut R,
    ) -> SimResult<u8> {
        let entry = self
            .states
            .get_mut(&key)
            .ok_or(SimError::StateNotFound(key.0))?;
        let ket = &entry.ket;

        let (collapsed0, collapsed1) = match ket.len() {
            2 => {
                let b0 = Array1::from(basis[0].to_vec());
                let b1 = Array1::from(basis[1].to_vec());
                let a0 = b0.mapv(|c| c.conj()).dot(ket);
                let a1 = b1.mapv(|c| c.conj()).dot(ket);
                (b0.mapv(|c| c * a0), b1.mapv(|c| c * a1))
            }
            4 => {
                let p0 = on_qubit(&projector(&basis[0]), qubit);
                let p1 = on_qubit(&projector(&basis[1]), qubit);
                (p0.dot(ket), p1.dot(ket))
            }
            n => return Err(SimError::Dimension(n)),
        };

        let prob0 = norm_sqr(&collapsed0);
        let prob1 = norm_sqr(&collapsed1);
        let total = prob0 + prob1;
        let outcome = if total > 0.0 && rng.r#gen::<f64>() < prob0 / total {
            0
        } else {
            1
        };

        let (chosen, prob) = if outcome == 0 {
            (collapsed0, prob0)
        } else {
            (collapsed1, prob1)
        };
        if prob > 0.0 {
            let scale = Complex64::new(1.0 / prob.sqrt(), 0.0);
            entry.ket = chosen.mapv(|c| c * scale);
        }
        Ok(outcome)
    }
}

/// Squared norm of a ket.
pub fn norm_sqr(ket: &Ket) -> f64 {
    ket.iter().map(|c| c.norm_sqr()).sum()
}

/// `|H⟩`, the default single-photon polarization.
pub fn horizontal() -> Ket {
    array![Complex64::new(1.0, 0.0), Complex64::new(0.0, 0.0)]
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn c(re: f64) -> Complex64 {
        Complex64::new(re, 0.0)
    }

    fn psi_plus() -> Ket {
        array![c(0.0), c(SQRT_HALF), c(SQRT_HALF), c(0.0)]
    }

    #[test]
    fn test_dimension_checked() {
        let mut qm = QuantumManager::new();
        let err = qm.new_ket(array![c(1.0), c(0.0), c(0.0)], 1).unwrap_err();
        assert!(matches!(err, SimError::Dimension(3)));
    }

    #[test]
    fn test_set_ket_rejects_dimension_change() {
        let mut qm = QuantumManager::new();
        let key = qm.new_ket(psi_plus(), 2).unwrap();
        let err = qm.set_ket(key, horizontal()).unwrap_err();
        assert!(matches!(err, SimError::Dimension(2)));
        assert_eq!(qm.ket(key).unwrap().len(), 4);
    }

    #[test]
    fn test_release_frees_after_last_holder() {
        let mut qm = QuantumManager::new();
        let key = qm.new_ket(psi_plus(), 2).unwrap();
        qm.release(key);
        assert_eq!(qm.len(), 1);
        qm.release(key);
        assert!(qm.is_empty());
        assert!(matches!(qm.ket(key), Err(SimError::StateNotFound(_))));
    }

    #[test]
    fn test_measure_eigenstate_is_deterministic() {
        let mut qm = QuantumManager::new();
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..20 {
            let key = qm.new_ket(horizontal(), 1).unwrap();
            assert_eq!(qm.measure(key, 0, &POLARIZATION_BASES[0], &mut rng).unwrap(), 0);
            let v = qm.new_ket(array![c(0.0), c(1.0)], 1).unwrap();
            assert_eq!(qm.measure(v, 0, &POLARIZATION_BASES[0], &mut rng).unwrap(), 1);
        }
    }

    #[test]
    fn test_entangled_measurement_is_anticorrelated() {
        // |Ψ+⟩ in H/V: measuring both photons always gives opposite outcomes.
        let mut qm = QuantumManager::new();
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..50 {
            let key = qm.new_ket(psi_plus(), 2).unwrap();
            let a = qm.measure(key, 0, &POLARIZATION_BASES[0], &mut rng).unwrap();
            let b = qm.measure(key, 1, &POLARIZATION_BASES[0], &mut rng).unwrap();
            assert_ne!(a, b);
            assert!((norm_sqr(qm.ket(key).unwrap()) - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn test_entangled_measurement_in_diagonal_basis_is_correlated() {
        // |Ψ+⟩ = (|++⟩ - |--⟩)/√2 in the diagonal basis.
        let mut qm = QuantumManager::new();
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..50 {
            let key = qm.new_ket(psi_plus(), 2).unwrap();
            let a = qm.measure(key, 0, &POLARIZATION_BASES[1], &mut rng).unwrap();
            let b = qm.measure(key, 1, &POLARIZATION_BASES[1], &mut rng).unwrap();
            assert_eq!(a, b);
        }
    }

    #[test]
    fn test_basis_index_out_of_range() {
        assert!(polarization_basis(1).is_ok());
        assert!(matches!(
            polarization_basis(2),
            Err(SimError::Configuration(_))
        ));
    }
}
