//! Error types for the simulation crate.

use thiserror::Error;

use crate::photon::Encoding;

/// Errors produced while building or running a photonic simulation.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SimError {
    /// Invalid component or node configuration.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The pair-statistics model name is not recognized.
    #[error("Unknown photon_statistics mode: {0}")]
    UnknownStatistics(String),

    /// The Bell-state label is not one of phi+, phi-, psi+, psi-.
    #[error("Unknown Bell state: {0}")]
    UnknownBellState(String),

    /// The analyzer basis label is not one of Z, X, Y.
    #[error("Unknown basis '{0}'. Use 'Z', 'X', or 'Y'.")]
    UnknownBasis(String),

    /// A node or task references a node name that was never built.
    #[error("Unknown node '{0}'")]
    UnknownNode(String),

    /// A task names a method the target node does not expose.
    #[error("Node '{node}' has no method '{method}'")]
    MissingMethod {
        /// Target node.
        node: String,
        /// Requested method.
        method: String,
    },

    /// A task carries arguments the method cannot accept.
    #[error("Invalid argument for '{node}.{method}': {reason}")]
    InvalidArgument {
        /// Target node.
        node: String,
        /// Requested method.
        method: String,
        /// What was wrong.
        reason: String,
    },

    /// Components are wired inconsistently (receiver counts, link ends).
    #[error("Wiring error: {0}")]
    Wiring(String),

    /// A photon reached a component configured for another encoding.
    #[error("Encoding mismatch at '{component}': expected {expected}, got {found}")]
    EncodingMismatch {
        /// Component that rejected the photon.
        component: String,
        /// Encoding the component accepts.
        expected: Encoding,
        /// Encoding the photon carries.
        found: Encoding,
    },

    /// A state vector is neither a single photon (2) nor a pair (4).
    #[error("Unexpected photon state dimension {0}")]
    Dimension(usize),

    /// A photon sharing a two-photon state has no usable pair-role tag.
    #[error("Photon '{0}' in an entangled state must be named '0' or '1'")]
    AmbiguousPairRole(String),

    /// A photon references a quantum state that no longer exists.
    #[error("Quantum state {0} not found")]
    StateNotFound(u64),

    /// An action was scheduled before the current simulation time.
    #[error("Cannot schedule at {time} ps: simulation time is already {now} ps")]
    ScheduleInPast {
        /// Requested time.
        time: u64,
        /// Current kernel time.
        now: u64,
    },

    /// Malformed node parameters.
    #[error(transparent)]
    Experiment(#[from] qpat_experiment::ExperimentError),
}

/// Result type for simulation operations.
pub type SimResult<T> = Result<T, SimError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = SimError::MissingMethod {
            node: "Alice".into(),
            method: "emit".into(),
        };
        assert_eq!(err.to_string(), "Node 'Alice' has no method 'emit'");

        let err = SimError::Dimension(8);
        assert_eq!(err.to_string(), "Unexpected photon state dimension 8");

        let err = SimError::EncodingMismatch {
            component: "Alice.qwp".into(),
            expected: Encoding::Polarization,
            found: Encoding::TimeBin,
        };
        assert_eq!(
            err.to_string(),
            "Encoding mismatch at 'Alice.qwp': expected polarization, got time_bin"
        );
    }
}
