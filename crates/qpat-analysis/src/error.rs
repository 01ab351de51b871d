//! Error types for coincidence analysis.

use thiserror::Error;

/// Result type for analysis operations.
pub type AnalysisResult<T> = Result<T, AnalysisError>;

/// Errors that can occur while configuring or evaluating a coincidence model.
#[derive(Error, Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum AnalysisError {
    /// The coincidence window is zero, negative or not finite.
    #[error("Invalid coincidence window: {0}")]
    InvalidWindow(String),

    /// A rate was requested over a non-positive measurement time.
    #[error("Invalid measurement duration: {0} s")]
    InvalidDuration(f64),

    /// The coincidence method name is not recognized.
    #[error("Unknown coincidence method '{0}'. Use 'window' or 'binned'.")]
    UnknownMethod(String),
}
