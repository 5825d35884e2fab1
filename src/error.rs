//! Error types for the fact checker

use crate::oracle::OracleError;

/// Crate-wide result alias
pub type Result<T> = std::result::Result<T, FactCheckError>;

/// Errors raised by fact checker components
///
/// The pipeline itself never surfaces these to callers of `check`; they are
/// recovered into fallbacks or structured outcomes at the orchestrator.
#[derive(Debug, thiserror::Error)]
pub enum FactCheckError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Oracle error: {0}")]
    Oracle(#[from] OracleError),

    #[error("Embedding error: {0}")]
    Embedding(String),

    #[error("Vector index error: {0}")]
    VectorIndex(String),

    #[error("Corpus error: {0}")]
    Corpus(String),

    #[error("Timed out after {0:?}")]
    Timeout(std::time::Duration),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<config::ConfigError> for FactCheckError {
    fn from(err: config::ConfigError) -> Self {
        FactCheckError::Config(err.to_string())
    }
}
