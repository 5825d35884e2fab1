//! Knowledge base: chunk models, corpus sources, and the lexical index
//!
//! - Chunks carry source provenance (url, title, publication date)
//! - Corpus snapshots come from any [`ChunkSource`]
//! - [`LexicalIndex`] provides BM25 ranking over the snapshot

pub mod inspect;
pub mod lexical;
pub mod models;
pub mod source;
pub mod text;

pub use inspect::{summarize, KnowledgeBaseSummary};
pub use lexical::{Bm25Params, LexicalIndex, SharedLexicalIndex};
pub use models::{Chunk, ChunkMetadata, ScoredChunk};
pub use source::{ChunkSource, JsonArticleSource};
