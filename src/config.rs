//! Layered configuration: TOML file, then `FACTCHECK__*` environment overrides

use crate::error::{FactCheckError, Result};
use secrecy::SecretString;
use serde::Deserialize;
use std::time::Duration;

/// Environment prefix for overrides, e.g. `FACTCHECK__ORACLE__MODEL`
pub const ENV_PREFIX: &str = "FACTCHECK";

/// Top-level configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub oracle: OracleConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub vector_db: VectorDbConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub pipeline: PipelineConfig,
    #[serde(default)]
    pub corpus: CorpusConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

impl Config {
    /// Load configuration from an optional TOML file plus the environment
    pub fn load(path: Option<&str>) -> Result<Self> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(config::File::with_name(path).required(false));
        }

        let settings = builder
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: Config = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from a TOML string (no environment overlay)
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Config = config::Config::builder()
            .add_source(config::File::from_str(content, config::FileFormat::Toml))
            .build()?
            .try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings the pipeline cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.retrieval.top_k == 0 {
            return Err(FactCheckError::Config("retrieval.top_k must be > 0".to_string()));
        }
        if !(self.retrieval.rrf_constant > 0.0) {
            return Err(FactCheckError::Config(
                "retrieval.rrf_constant must be > 0".to_string(),
            ));
        }
        if self.corpus.chunk_size == 0 || self.corpus.chunk_overlap >= self.corpus.chunk_size {
            return Err(FactCheckError::Config(format!(
                "corpus.chunk_overlap ({}) must be smaller than corpus.chunk_size ({})",
                self.corpus.chunk_overlap, self.corpus.chunk_size
            )));
        }
        if self.pipeline.max_concurrent_claims == 0 || self.pipeline.max_concurrent_alignments == 0 {
            return Err(FactCheckError::Config(
                "pipeline concurrency limits must be > 0".to_string(),
            ));
        }
        if self.oracle.max_concurrent_requests == 0 {
            return Err(FactCheckError::Config(
                "oracle.max_concurrent_requests must be > 0".to_string(),
            ));
        }
        Ok(())
    }
}

/// Language oracle (Ollama chat API) configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OracleConfig {
    #[serde(default = "default_ollama_url")]
    pub url: String,

    #[serde(default = "default_oracle_model")]
    pub model: String,

    /// Bearer token for proxies in front of the oracle
    #[serde(default)]
    pub api_key: Option<SecretString>,

    #[serde(default = "default_oracle_timeout_ms")]
    pub timeout_ms: u64,

    #[serde(default = "default_max_concurrent_requests")]
    pub max_concurrent_requests: usize,

    #[serde(default = "default_retry_attempts")]
    pub retry_attempts: usize,

    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,

    #[serde(default = "default_breaker_failures")]
    pub circuit_breaker_failures: usize,

    #[serde(default = "default_breaker_reset")]
    pub circuit_breaker_reset_secs: u64,

    #[serde(default)]
    pub temperature: Option<f32>,
}

fn default_ollama_url() -> String { "http://localhost:11434".to_string() }
fn default_oracle_model() -> String { "gemma3:4b".to_string() }
fn default_oracle_timeout_ms() -> u64 { 60_000 }
fn default_max_concurrent_requests() -> usize { 4 }
fn default_retry_attempts() -> usize { 2 }
fn default_retry_backoff_ms() -> u64 { 200 }
fn default_breaker_failures() -> usize { 5 }
fn default_breaker_reset() -> u64 { 30 }

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            url: default_ollama_url(),
            model: default_oracle_model(),
            api_key: None,
            timeout_ms: default_oracle_timeout_ms(),
            max_concurrent_requests: default_max_concurrent_requests(),
            retry_attempts: default_retry_attempts(),
            retry_backoff_ms: default_retry_backoff_ms(),
            circuit_breaker_failures: default_breaker_failures(),
            circuit_breaker_reset_secs: default_breaker_reset(),
            temperature: None,
        }
    }
}

impl OracleConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_ms)
    }

    pub fn breaker_reset_timeout(&self) -> Duration {
        Duration::from_secs(self.circuit_breaker_reset_secs)
    }
}

/// Embedding service configuration
#[derive(Debug, Clone, Deserialize)]
pub struct EmbeddingConfig {
    #[serde(default = "default_ollama_url")]
    pub url: String,

    #[serde(default = "default_embedding_model")]
    pub model: String,

    #[serde(default = "default_embedding_timeout_ms")]
    pub timeout_ms: u64,

    #[serde(default = "default_embedding_cache_size")]
    pub cache_size: u64,

    #[serde(default = "default_embedding_cache_ttl")]
    pub cache_ttl_secs: u64,
}

fn default_embedding_model() -> String { "shibing624/text2vec-base-chinese".to_string() }
fn default_embedding_timeout_ms() -> u64 { 10_000 }
fn default_embedding_cache_size() -> u64 { 1024 }
fn default_embedding_cache_ttl() -> u64 { 600 }

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            url: default_ollama_url(),
            model: default_embedding_model(),
            timeout_ms: default_embedding_timeout_ms(),
            cache_size: default_embedding_cache_size(),
            cache_ttl_secs: default_embedding_cache_ttl(),
        }
    }
}

impl EmbeddingConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }
}

/// Qdrant configuration
#[derive(Debug, Clone, Deserialize)]
pub struct VectorDbConfig {
    #[serde(default = "default_qdrant_url")]
    pub url: String,

    #[serde(default = "default_collection_name")]
    pub collection_name: String,

    #[serde(default)]
    pub api_key: Option<SecretString>,

    /// Page size used when scrolling the whole collection at startup
    #[serde(default = "default_scroll_batch_size")]
    pub scroll_batch_size: u32,
}

fn default_qdrant_url() -> String { "http://localhost:6334".to_string() }
fn default_collection_name() -> String { "fact_checking_collection".to_string() }
fn default_scroll_batch_size() -> u32 { 256 }

impl Default for VectorDbConfig {
    fn default() -> Self {
        Self {
            url: default_qdrant_url(),
            collection_name: default_collection_name(),
            api_key: None,
            scroll_batch_size: default_scroll_batch_size(),
        }
    }
}

/// Hybrid retrieval tuning
#[derive(Debug, Clone, Deserialize)]
pub struct RetrievalConfig {
    #[serde(default = "default_top_k")]
    pub top_k: usize,

    /// Larger values flatten the influence of top ranks
    #[serde(default = "default_rrf_constant")]
    pub rrf_constant: f64,

    #[serde(default = "default_bm25_k1")]
    pub bm25_k1: f32,

    #[serde(default = "default_bm25_b")]
    pub bm25_b: f32,
}

fn default_top_k() -> usize { 5 }
fn default_rrf_constant() -> f64 { 60.0 }
fn default_bm25_k1() -> f32 { 1.5 }
fn default_bm25_b() -> f32 { 0.75 }

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
            rrf_constant: default_rrf_constant(),
            bm25_k1: default_bm25_k1(),
            bm25_b: default_bm25_b(),
        }
    }
}

/// Orchestrator limits
#[derive(Debug, Clone, Deserialize)]
pub struct PipelineConfig {
    /// Upper bound for any single oracle, embedding or vector call
    #[serde(default = "default_service_timeout_ms")]
    pub service_timeout_ms: u64,

    #[serde(default = "default_max_concurrent_claims")]
    pub max_concurrent_claims: usize,

    #[serde(default = "default_max_concurrent_alignments")]
    pub max_concurrent_alignments: usize,
}

fn default_service_timeout_ms() -> u64 { 120_000 }
fn default_max_concurrent_claims() -> usize { 1 }
fn default_max_concurrent_alignments() -> usize { 4 }

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            service_timeout_ms: default_service_timeout_ms(),
            max_concurrent_claims: default_max_concurrent_claims(),
            max_concurrent_alignments: default_max_concurrent_alignments(),
        }
    }
}

impl PipelineConfig {
    pub fn service_timeout(&self) -> Duration {
        Duration::from_millis(self.service_timeout_ms)
    }
}

/// Where the knowledge-base snapshot comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CorpusSourceKind {
    /// Scroll every chunk stored in the vector collection
    VectorDb,
    /// Processed-articles JSON file, chunked locally
    Json,
}

/// Corpus snapshot configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CorpusConfig {
    #[serde(default = "default_corpus_source")]
    pub source: CorpusSourceKind,

    #[serde(default = "default_corpus_path")]
    pub path: String,

    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,
}

fn default_corpus_source() -> CorpusSourceKind { CorpusSourceKind::VectorDb }
fn default_corpus_path() -> String { "data/processed_articles.json".to_string() }
fn default_chunk_size() -> usize { 512 }
fn default_chunk_overlap() -> usize { 50 }

impl Default for CorpusConfig {
    fn default() -> Self {
        Self {
            source: default_corpus_source(),
            path: default_corpus_path(),
            chunk_size: default_chunk_size(),
            chunk_overlap: default_chunk_overlap(),
        }
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default = "default_log_format")]
    pub format: LogFormat,
}

fn default_log_level() -> String { "info".to_string() }
fn default_log_format() -> LogFormat { LogFormat::Pretty }

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

fn default_host() -> String { "0.0.0.0".to_string() }
fn default_port() -> u16 { 8081 }
fn default_max_body_bytes() -> usize { 64 * 1024 }

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            max_body_bytes: default_max_body_bytes(),
        }
    }
}
