//! Dense retrieval over a Qdrant collection
//!
//! The collection is populated by the indexing pipeline; this module only
//! reads it. The same collection doubles as the corpus snapshot the lexical
//! index is built from, so both retrievers see identical chunk ids.

use crate::config::VectorDbConfig;
use crate::error::{FactCheckError, Result};
use crate::knowledge::{Chunk, ChunkMetadata, ChunkSource};
use async_trait::async_trait;
use qdrant_client::{
    client::QdrantClient,
    qdrant::{
        point_id::PointIdOptions, value::Kind, PointId, ScrollPoints, SearchPoints, Value,
    },
};
use secrecy::ExposeSecret;
use std::collections::HashMap;
use tracing::{debug, info, warn};

/// Payload keys that may hold the chunk text
const CONTENT_KEYS: [&str; 3] = ["content", "page_content", "document"];

/// Similarity search over pre-computed chunk embeddings
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Up to `top_k` chunks ranked by similarity to `embedding`
    async fn query(&self, embedding: &[f32], top_k: usize) -> Result<Vec<Chunk>>;
}

/// Qdrant-backed vector index
pub struct QdrantVectorIndex {
    client: QdrantClient,
    config: VectorDbConfig,
}

impl QdrantVectorIndex {
    pub fn new(client: QdrantClient, config: VectorDbConfig) -> Self {
        Self { client, config }
    }

    /// Connect using the configured URL and optional API key
    pub fn connect(config: VectorDbConfig) -> Result<Self> {
        let mut builder = QdrantClient::from_url(&config.url);
        if let Some(api_key) = &config.api_key {
            builder = builder.with_api_key(api_key.expose_secret().as_str());
        }
        let client = builder
            .build()
            .map_err(|e| FactCheckError::VectorIndex(format!("Failed to create Qdrant client: {}", e)))?;

        Ok(Self::new(client, config))
    }
}

#[async_trait]
impl VectorIndex for QdrantVectorIndex {
    async fn query(&self, embedding: &[f32], top_k: usize) -> Result<Vec<Chunk>> {
        if top_k == 0 {
            return Ok(Vec::new());
        }

        let response = self
            .client
            .search_points(&SearchPoints {
                collection_name: self.config.collection_name.clone(),
                vector: embedding.to_vec(),
                limit: top_k as u64,
                with_payload: Some(true.into()),
                ..Default::default()
            })
            .await
            .map_err(|e| FactCheckError::VectorIndex(format!("Search failed: {}", e)))?;

        let chunks: Vec<Chunk> = response
            .result
            .iter()
            .filter_map(|point| chunk_from_payload(point.id.as_ref(), &point.payload))
            .collect();

        debug!("Vector search returned {} chunks", chunks.len());
        Ok(chunks)
    }
}

#[async_trait]
impl ChunkSource for QdrantVectorIndex {
    fn name(&self) -> &str {
        "qdrant"
    }

    async fn fetch(&self) -> Result<Vec<Chunk>> {
        let mut chunks = Vec::new();
        let mut offset: Option<PointId> = None;

        loop {
            let page = self
                .client
                .scroll(&ScrollPoints {
                    collection_name: self.config.collection_name.clone(),
                    offset: offset.take(),
                    limit: Some(self.config.scroll_batch_size),
                    with_payload: Some(true.into()),
                    with_vectors: Some(false.into()),
                    ..Default::default()
                })
                .await
                .map_err(|e| FactCheckError::VectorIndex(format!("Scroll failed: {}", e)))?;

            for point in &page.result {
                match chunk_from_payload(point.id.as_ref(), &point.payload) {
                    Some(chunk) => chunks.push(chunk),
                    None => warn!("Skipping point without text payload: {:?}", point.id),
                }
            }

            match page.next_page_offset {
                Some(next) => offset = Some(next),
                None => break,
            }
        }

        info!(
            "Fetched {} chunks from collection {}",
            chunks.len(),
            self.config.collection_name
        );
        Ok(chunks)
    }
}

/// Map a point payload to a chunk.
///
/// Metadata may sit at the top level or under a nested `metadata` object.
/// An explicit `chunk_id` field wins over the point id.
pub fn chunk_from_payload(id: Option<&PointId>, payload: &HashMap<String, Value>) -> Option<Chunk> {
    let content = CONTENT_KEYS
        .iter()
        .find_map(|key| string_field(payload, key))?;

    let id = string_field(payload, "chunk_id").or_else(|| id.and_then(point_id_to_string))?;

    let nested = match payload.get("metadata").and_then(|v| v.kind.as_ref()) {
        Some(Kind::StructValue(s)) => Some(&s.fields),
        _ => None,
    };
    let field = |key: &str| {
        nested
            .and_then(|fields| string_field(fields, key))
            .or_else(|| string_field(payload, key))
    };

    let metadata = ChunkMetadata {
        source: field("source").unwrap_or_else(|| "unknown".to_string()),
        url: field("url").unwrap_or_default(),
        title: field("title").unwrap_or_default(),
        scraped_at: field("scraped_at").unwrap_or_default(),
        publication_date: field("publication_date").unwrap_or_default(),
    };

    Some(Chunk::new(id, content, metadata))
}

fn string_field(payload: &HashMap<String, Value>, key: &str) -> Option<String> {
    match payload.get(key)?.kind.as_ref()? {
        Kind::StringValue(s) => Some(s.clone()),
        _ => None,
    }
}

fn point_id_to_string(id: &PointId) -> Option<String> {
    match id.point_id_options.as_ref()? {
        PointIdOptions::Num(n) => Some(n.to_string()),
        PointIdOptions::Uuid(uuid) => Some(uuid.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use qdrant_client::qdrant::Struct;

    fn string_value(s: &str) -> Value {
        Value {
            kind: Some(Kind::StringValue(s.to_string())),
        }
    }

    fn uuid_id(s: &str) -> PointId {
        PointId {
            point_id_options: Some(PointIdOptions::Uuid(s.to_string())),
        }
    }

    #[test]
    fn test_flat_payload() {
        let mut payload = HashMap::new();
        payload.insert("content".to_string(), string_value("chunk text"));
        payload.insert("source".to_string(), string_value("TFC"));
        payload.insert("publication_date".to_string(), string_value("2024-03-01"));

        let chunk = chunk_from_payload(Some(&uuid_id("p-1")), &payload).unwrap();
        assert_eq!(chunk.id, "p-1");
        assert_eq!(chunk.content, "chunk text");
        assert_eq!(chunk.metadata.source, "TFC");
        assert_eq!(chunk.metadata.publication_date, "2024-03-01");
        assert_eq!(chunk.metadata.url, "");
    }

    #[test]
    fn test_nested_metadata_and_explicit_chunk_id() {
        let mut fields = HashMap::new();
        fields.insert("title".to_string(), string_value("Outage report"));
        fields.insert("url".to_string(), string_value("https://example.org/a"));

        let mut payload = HashMap::new();
        payload.insert("page_content".to_string(), string_value("text"));
        payload.insert("chunk_id".to_string(), string_value("chunk-7"));
        payload.insert(
            "metadata".to_string(),
            Value {
                kind: Some(Kind::StructValue(Struct { fields })),
            },
        );

        let id = PointId {
            point_id_options: Some(PointIdOptions::Num(42)),
        };
        let chunk = chunk_from_payload(Some(&id), &payload).unwrap();
        assert_eq!(chunk.id, "chunk-7");
        assert_eq!(chunk.metadata.title, "Outage report");
        assert_eq!(chunk.metadata.url, "https://example.org/a");
        assert_eq!(chunk.metadata.source, "unknown");
    }

    #[test]
    fn test_numeric_point_id() {
        let mut payload = HashMap::new();
        payload.insert("document".to_string(), string_value("text"));
        let id = PointId {
            point_id_options: Some(PointIdOptions::Num(42)),
        };
        assert_eq!(chunk_from_payload(Some(&id), &payload).unwrap().id, "42");
    }

    #[test]
    fn test_payload_without_text_is_rejected() {
        let mut payload = HashMap::new();
        payload.insert("title".to_string(), string_value("no body"));
        assert!(chunk_from_payload(Some(&uuid_id("p")), &payload).is_none());
    }

    // Requires a running Qdrant instance
    #[tokio::test]
    #[ignore]
    async fn test_fetch_from_live_collection() {
        let index = QdrantVectorIndex::connect(VectorDbConfig::default()).unwrap();
        assert!(index.fetch().await.is_ok());
    }
}
