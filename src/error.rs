//! Error types for fmdiag

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// fmdiag errors
#[derive(Error, Debug)]
pub enum Error {
    /// A relationship or probe referenced a feature that has no variable in
    /// the constraint store. Indicates model/store desynchronization and is
    /// fatal to the current analysis run.
    #[error("Unknown feature: {0}")]
    UnknownFeature(String),

    #[error("Duplicate feature name: {0}")]
    DuplicateFeature(String),

    /// A group relationship (or/alternative) was declared with no branches.
    #[error("Relationship {rule} has an empty branch group")]
    EmptyGroup { rule: String },

    /// A feature model with no features has nothing to analyze.
    #[error("Feature model is empty")]
    EmptyModel,

    /// Diagnosis enumeration hit a configured cap. Recoverable: the probe
    /// that raised it still holds a valid seed diagnosis.
    #[error("Diagnosis enumeration exceeded the configured cap ({limit})")]
    DiagnosisLimit { limit: usize },

    /// The caller's cancellation flag was observed mid-solve.
    #[error("Analysis cancelled")]
    Cancelled,

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_norway::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

impl From<&str> for Error {
    fn from(s: &str) -> Self {
        Error::Other(s.to_string())
    }
}

impl From<String> for Error {
    fn from(s: String) -> Self {
        Error::Other(s)
    }
}
