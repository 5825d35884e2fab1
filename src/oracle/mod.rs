//! Language oracle: external text generation consumed as request/response
//!
//! Used for three tasks: query rewriting (free text), claim extraction and
//! evidence alignment (JSON). Connectivity failures and unusable replies are
//! both reported as [`OracleError`], so callers handle one failure branch.

pub mod circuit_breaker;
pub mod models;
pub mod ollama;
pub mod prompts;

pub use models::{
    decode_json, AlignmentPayload, ClaimsPayload, OracleRequest, OracleTask, ResponseFormat,
};
pub use ollama::OllamaOracle;

use async_trait::async_trait;

/// Oracle failure kinds
#[derive(Debug, Clone, thiserror::Error)]
pub enum OracleError {
    #[error("Circuit breaker is open: {0}")]
    CircuitOpen(String),

    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("Upstream error: {0}")]
    Upstream(String),

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("Malformed response: {0}")]
    Malformed(String),

    #[error("Empty response")]
    Empty,
}

/// Request/response text generation service
#[async_trait]
pub trait LanguageOracle: Send + Sync {
    /// Send one rendered instruction and return the raw reply text
    async fn complete(&self, request: OracleRequest) -> Result<String, OracleError>;
}
