//! Claim embedding via an external embedding service

use crate::config::EmbeddingConfig;
use crate::error::{FactCheckError, Result};
use async_trait::async_trait;
use moka::future::Cache;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

/// Turns text into a dense vector
#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;
}

/// Ollama `/api/embeddings` client with a memoizing cache
pub struct HttpEmbedder {
    client: Client,
    config: EmbeddingConfig,
    cache: Cache<String, Arc<Vec<f32>>>,
}

impl HttpEmbedder {
    pub fn new(config: EmbeddingConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| FactCheckError::Embedding(e.to_string()))?;

        let cache = Cache::builder()
            .max_capacity(config.cache_size)
            .time_to_live(config.cache_ttl())
            .build();

        Ok(Self { client, config, cache })
    }

    async fn request_embedding(&self, text: &str) -> Result<Vec<f32>> {
        let url = format!("{}/api/embeddings", self.config.url.trim_end_matches('/'));
        let request = EmbeddingRequest {
            model: &self.config.model,
            prompt: text,
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| FactCheckError::Embedding(format!("Request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FactCheckError::Embedding(format!("HTTP {}: {}", status, body)));
        }

        let parsed: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| FactCheckError::Embedding(format!("Invalid response: {}", e)))?;

        if parsed.embedding.is_empty() {
            return Err(FactCheckError::Embedding("Empty embedding returned".to_string()));
        }

        Ok(parsed.embedding)
    }
}

#[async_trait]
impl Embedder for HttpEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        if let Some(hit) = self.cache.get(text).await {
            debug!("Embedding cache hit");
            return Ok(hit.as_ref().clone());
        }

        let embedding = self.request_embedding(text).await?;
        self.cache
            .insert(text.to_string(), Arc::new(embedding.clone()))
            .await;
        Ok(embedding)
    }
}

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    prompt: &'a str,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    embedding: Vec<f32>,
}
