//! Error types for capabilities and orchestration.

use qpat_analysis::AnalysisError;
use qpat_experiment::ExperimentError;
use qpat_sim::SimError;
use thiserror::Error;

/// Errors raised while creating or running a capability.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CapabilityError {
    /// The factory does not know how to build this capability.
    #[error("Unknown capability '{0}'")]
    UnknownCapability(String),

    /// No capability with this name is held by the registry.
    #[error("Capability '{0}' not registered")]
    NotRegistered(String),

    /// A run parameter is missing or out of range.
    #[error("Invalid parameter '{name}': {reason}")]
    InvalidParameter {
        /// Parameter key.
        name: String,
        /// What was wrong with it.
        reason: String,
    },

    /// Simulation build or run failure.
    #[error("Simulation error: {0}")]
    Sim(#[from] SimError),

    /// Coincidence analysis failure.
    #[error("Analysis error: {0}")]
    Analysis(#[from] AnalysisError),

    /// Topology or parameter-model failure.
    #[error("Experiment error: {0}")]
    Experiment(#[from] ExperimentError),
}

/// Result type for capability operations.
pub type CapabilityResult<T> = Result<T, CapabilityError>;
