//! Error types for the amalgamation pipeline

use std::path::PathBuf;

use crate::amalgamate::Amalgamation;

/// Result alias used throughout the library
pub type Result<T> = std::result::Result<T, AmalgamateError>;

/// Errors raised while validating inputs, clustering groups, or persisting results
#[derive(Debug, thiserror::Error)]
pub enum AmalgamateError {
    /// Matrix is not square, or its labels do not match the dataset's groups
    #[error("shape mismatch: expected {expected}, found {actual}")]
    ShapeMismatch { expected: String, actual: String },

    /// Distances must be non-negative
    #[error("invalid distance {value} between '{first}' and '{second}'")]
    InvalidDistance {
        first: String,
        second: String,
        value: f64,
    },

    #[error("invalid threshold {0}: must be a non-negative number")]
    InvalidThreshold(f64),

    /// The dataset holds entities with no group assignment
    #[error("entity {entity} has no group label")]
    MissingGroupLabel { entity: usize },

    /// A synthetic cluster name is already used by a group outside that cluster
    #[error("generated name '{name}' collides with an existing group")]
    NameCollision { name: String },

    #[error("failed to write reassignment table to {}: {}", .path.display(), .source)]
    TableWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Table could not be persisted; the computed amalgamation is kept for the caller
    #[error("amalgamation computed but not persisted: {source}")]
    TablePersist {
        #[source]
        source: Box<AmalgamateError>,
        amalgamation: Box<Amalgamation>,
    },

    /// Signals a defect in the connectivity code, never a data problem
    #[error("internal invariant violated: {0}")]
    InternalInvariantViolation(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("data frame error: {0}")]
    Frame(#[from] polars::prelude::PolarsError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl AmalgamateError {
    pub(crate) fn shape(expected: impl Into<String>, actual: impl Into<String>) -> Self {
        Self::ShapeMismatch {
            expected: expected.into(),
            actual: actual.into(),
        }
    }
}
