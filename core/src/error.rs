//! Error types for the search engine, the OMP oracle and configuration

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while configuring or running an A*OMP reconstruction
#[derive(Error, Debug)]
pub enum AstarError {
    #[error("unsupported initial path length {0} (expected 1 or 2)")]
    UnsupportedInitialPathLength(usize),

    #[error("requested {requested} initial paths but the dictionary holds {available} elements")]
    TooManyInitialPaths { requested: usize, available: usize },

    #[error("invalid auxiliary function mode: {0}")]
    InvalidAuxiliaryMode(String),

    #[error("invalid cost model parameter: {0}")]
    InvalidCostParameter(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("dimension mismatch for {what}: expected {expected}, got {actual}")]
    DimensionMismatch {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("initialization failed: no initial paths returned")]
    NoInitialPaths,

    #[error("search stack contains no paths; initialize the search first")]
    EmptyStack,

    #[error("search exhausted every candidate path before reaching completion")]
    Exhausted,

    #[error("failed to read configuration {path}: {source}")]
    ConfigIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Load(#[from] crate::loader::LoadError),
}

impl AstarError {
    /// Whether the failure only concerns the current observation vector.
    ///
    /// A batch run skips such vectors and carries on with the next one.
    pub fn is_per_vector(&self) -> bool {
        matches!(self, AstarError::NoInitialPaths | AstarError::Exhausted)
    }
}

/// Result type for A*OMP operations
pub type AstarResult<T> = Result<T, AstarError>;
