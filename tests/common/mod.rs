//! In-process stand-ins for the external services

#![allow(dead_code)]

use async_trait::async_trait;
use fact_checker::{
    knowledge::{Chunk, ChunkMetadata, LexicalIndex, SharedLexicalIndex},
    oracle::{LanguageOracle, OracleError, OracleRequest, OracleTask},
    retrieval::{Embedder, VectorIndex},
    FactCheckError, FactCheckOrchestrator, OrchestratorSettings,
};
use std::sync::{Arc, Mutex};

type Reply = Box<dyn Fn(&OracleRequest) -> Result<String, OracleError> + Send + Sync>;

/// Oracle answering from a closure and recording every request
pub struct FakeOracle {
    reply: Reply,
    pub requests: Mutex<Vec<OracleRequest>>,
}

impl FakeOracle {
    pub fn new(
        reply: impl Fn(&OracleRequest) -> Result<String, OracleError> + Send + Sync + 'static,
    ) -> Arc<Self> {
        Arc::new(Self {
            reply: Box::new(reply),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self, task: OracleTask) -> usize {
        self.requests.lock().unwrap().iter().filter(|r| r.task == task).count()
    }

    pub fn total_calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl LanguageOracle for FakeOracle {
    async fn complete(&self, request: OracleRequest) -> Result<String, OracleError> {
        self.requests.lock().unwrap().push(request.clone());
        (self.reply)(&request)
    }
}

pub struct FakeEmbedder;

#[async_trait]
impl Embedder for FakeEmbedder {
    async fn embed(&self, text: &str) -> fact_checker::Result<Vec<f32>> {
        Ok(vec![text.len() as f32, 1.0])
    }
}

/// Vector index that never finds anything
pub struct EmptyVectorIndex;

#[async_trait]
impl VectorIndex for EmptyVectorIndex {
    async fn query(&self, _embedding: &[f32], _top_k: usize) -> fact_checker::Result<Vec<Chunk>> {
        Ok(Vec::new())
    }
}

/// Vector index whose backend is down
pub struct UnreachableVectorIndex;

#[async_trait]
impl VectorIndex for UnreachableVectorIndex {
    async fn query(&self, _embedding: &[f32], _top_k: usize) -> fact_checker::Result<Vec<Chunk>> {
        Err(FactCheckError::VectorIndex("connection refused".to_string()))
    }
}

pub fn chunk(id: &str, content: &str) -> Chunk {
    Chunk::new(
        id,
        content,
        ChunkMetadata::new("fixture")
            .with_title(format!("Article {}", id))
            .with_url(format!("https://example.com/{}", id)),
    )
}

pub fn orchestrator(
    oracle: Arc<dyn LanguageOracle>,
    vector_index: Arc<dyn VectorIndex>,
    corpus: Vec<Chunk>,
) -> FactCheckOrchestrator {
    orchestrator_with_settings(oracle, vector_index, corpus, OrchestratorSettings::default())
}

pub fn orchestrator_with_settings(
    oracle: Arc<dyn LanguageOracle>,
    vector_index: Arc<dyn VectorIndex>,
    corpus: Vec<Chunk>,
    settings: OrchestratorSettings,
) -> FactCheckOrchestrator {
    FactCheckOrchestrator::new(
        oracle,
        Arc::new(FakeEmbedder),
        vector_index,
        Arc::new(SharedLexicalIndex::new(LexicalIndex::build(corpus))),
        settings,
    )
}
