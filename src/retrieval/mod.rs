//! Hybrid retrieval building blocks
//!
//! Dense search (embedder + Qdrant) and lexical search are fused with
//! reciprocal rank fusion by the orchestrator.

pub mod embedding;
pub mod fusion;
pub mod vector;

pub use embedding::{Embedder, HttpEmbedder};
pub use fusion::{FusedId, RankFusion, DEFAULT_RRF_CONSTANT};
pub use vector::{QdrantVectorIndex, VectorIndex};
