//! Error types for building, loading and querying a concept index.

use thiserror::Error;

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, SpectralError>;

#[derive(Error, Debug)]
pub enum SpectralError {
    /// The training corpus was empty or produced no usable vocabulary.
    #[error("Empty corpus: {0}")]
    EmptyCorpus(String),

    /// The rank-k factorization could not be computed.
    #[error("Decomposition error: {0}")]
    Decomposition(String),

    /// Artifacts disagree on shape or row alignment.
    #[error("Alignment error: {0}")]
    Alignment(String),

    /// A query was issued before the engine was initialized.
    #[error("Engine not loaded")]
    EngineNotLoaded,

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl From<serde_cbor::Error> for SpectralError {
    fn from(err: serde_cbor::Error) -> Self {
        SpectralError::Serialization(err.to_string())
    }
}

impl From<serde_json::Error> for SpectralError {
    fn from(err: serde_json::Error) -> Self {
        SpectralError::Serialization(err.to_string())
    }
}

impl SpectralError {
    /// Build and load errors leave no usable state behind.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, SpectralError::EngineNotLoaded | SpectralError::InvalidArgument(_))
    }
}
