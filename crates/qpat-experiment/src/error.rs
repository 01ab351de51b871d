//! Error types for the experiment crate.

use thiserror::Error;

/// Errors raised while assembling or loading an experiment description.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ExperimentError {
    /// A node with this name already exists in the topology.
    #[error("Node '{0}' already exists")]
    DuplicateNode(String),

    /// A node name was referenced but not declared.
    #[error("Unknown node '{0}'")]
    UnknownNode(String),

    /// A parameter value is out of range or has the wrong type.
    #[error("Invalid parameter '{name}': {reason}")]
    InvalidParameter {
        /// Parameter key.
        name: String,
        /// What was wrong with it.
        reason: String,
    },

    /// A required top-level section is absent from a YAML document.
    #[error("Missing '{0}' section in YAML")]
    MissingSection(&'static str),

    /// A required field is absent.
    #[error("{context} missing '{field}' field")]
    MissingField {
        /// Where the field was expected.
        context: &'static str,
        /// Field name.
        field: &'static str,
    },

    /// YAML syntax or shape error.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),

    /// IO error while reading a description file.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for experiment model operations.
pub type ExperimentResult<T> = Result<T, ExperimentError>;
