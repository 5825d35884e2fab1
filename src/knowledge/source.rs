//! Corpus sources: anything that can hand over a snapshot of chunks

use super::models::{Chunk, ChunkMetadata};
use super::text::{clean_text, split_text};
use crate::error::{FactCheckError, Result};
use async_trait::async_trait;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use std::path::PathBuf;
use tracing::{debug, info, warn};

/// Capability to fetch the chunks a knowledge base is built from
#[async_trait]
pub trait ChunkSource: Send + Sync {
    /// Human readable name for logs
    fn name(&self) -> &str;

    async fn fetch(&self) -> Result<Vec<Chunk>>;
}

/// Scraped article as stored in the processed-articles file
#[derive(Debug, Clone, Deserialize)]
pub struct Article {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub scraped_at: String,
    #[serde(default)]
    pub publication_date: Option<String>,
}

/// Reads scraped articles from a JSON array and chunks them locally
pub struct JsonArticleSource {
    path: PathBuf,
    chunk_size: usize,
    chunk_overlap: usize,
}

impl JsonArticleSource {
    pub fn new(path: impl Into<PathBuf>, chunk_size: usize, chunk_overlap: usize) -> Self {
        Self {
            path: path.into(),
            chunk_size,
            chunk_overlap,
        }
    }

    /// Turn articles into chunks; articles without content are skipped
    pub fn chunk_articles(&self, articles: Vec<Article>) -> Vec<Chunk> {
        let mut chunks = Vec::new();

        for article in articles {
            let content = clean_text(&article.content);
            if content.is_empty() {
                debug!("Skipping article without content: {}", article.url);
                continue;
            }

            let metadata = ChunkMetadata {
                source: article.source.unwrap_or_else(|| "unknown".to_string()),
                url: article.url,
                title: article.title,
                scraped_at: article.scraped_at,
                publication_date: article.publication_date.unwrap_or_default(),
            };

            for (ordinal, piece) in split_text(&content, self.chunk_size, self.chunk_overlap)
                .into_iter()
                .enumerate()
            {
                let id = chunk_id(&metadata.url, &metadata.title, ordinal);
                chunks.push(Chunk::new(id, piece, metadata.clone()));
            }
        }

        chunks
    }
}

/// Stable id for the `ordinal`-th chunk of an article
pub fn chunk_id(url: &str, title: &str, ordinal: usize) -> String {
    let mut hasher = Sha256::new();
    hasher.update(url.as_bytes());
    hasher.update(b"|");
    hasher.update(title.as_bytes());
    hasher.update(b"|");
    hasher.update(ordinal.to_string().as_bytes());
    hex::encode(hasher.finalize())
}

#[async_trait]
impl ChunkSource for JsonArticleSource {
    fn name(&self) -> &str {
        "json-articles"
    }

    async fn fetch(&self) -> Result<Vec<Chunk>> {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!("Article file not found at {}", self.path.display());
                return Ok(Vec::new());
            }
            Err(e) => return Err(e.into()),
        };

        let articles: Vec<Article> = serde_json::from_str(&raw).map_err(|e| {
            FactCheckError::Corpus(format!("Invalid article file {}: {}", self.path.display(), e))
        })?;

        let article_count = articles.len();
        let chunks = self.chunk_articles(articles);
        info!(
            "Loaded {} chunks from {} articles in {}",
            chunks.len(),
            article_count,
            self.path.display()
        );

        Ok(chunks)
    }
}
