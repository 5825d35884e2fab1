//! In-memory BM25 lexical index over the corpus snapshot
//!
//! Built once from the chunks the vector store holds, then read-only. A
//! rebuild goes through [`SharedLexicalIndex::publish`], which swaps the whole
//! index in one step so readers never observe a partially built one.

use super::models::{Chunk, ScoredChunk};
use indexmap::IndexMap;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock};
use tracing::{debug, info, warn};

/// Okapi BM25 parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bm25Params {
    /// Term-frequency saturation
    pub k1: f32,
    /// Document-length normalization
    pub b: f32,
}

impl Default for Bm25Params {
    fn default() -> Self {
        Self { k1: 1.5, b: 0.75 }
    }
}

/// Whitespace tokenizer with case folding; no stemming
pub fn tokenize(text: &str) -> Vec<String> {
    text.split_whitespace().map(|t| t.to_lowercase()).collect()
}

/// Sparse retriever over a fixed corpus
#[derive(Debug, Default)]
pub struct LexicalIndex {
    chunks: Vec<Chunk>,
    term_freqs: Vec<HashMap<String, u32>>,
    doc_lens: Vec<usize>,
    avg_doc_len: f32,
    idf: HashMap<String, f32>,
    params: Bm25Params,
}

impl LexicalIndex {
    /// Build an index with default BM25 parameters
    pub fn build(corpus: Vec<Chunk>) -> Self {
        Self::build_with_params(corpus, Bm25Params::default())
    }

    /// Build an index over `corpus`. Later chunks reusing an id are dropped.
    pub fn build_with_params(corpus: Vec<Chunk>, params: Bm25Params) -> Self {
        let mut seen = HashSet::new();
        let mut chunks = Vec::with_capacity(corpus.len());
        for chunk in corpus {
            if seen.insert(chunk.id.clone()) {
                chunks.push(chunk);
            } else {
                warn!("Duplicate chunk id {} ignored by lexical index", chunk.id);
            }
        }

        let mut term_freqs = Vec::with_capacity(chunks.len());
        let mut doc_lens = Vec::with_capacity(chunks.len());
        let mut doc_freq: HashMap<String, u32> = HashMap::new();

        for chunk in &chunks {
            let tokens = tokenize(&chunk.content);
            doc_lens.push(tokens.len());

            let mut freqs: HashMap<String, u32> = HashMap::new();
            for token in tokens {
                *freqs.entry(token).or_default() += 1;
            }
            for term in freqs.keys() {
                *doc_freq.entry(term.clone()).or_default() += 1;
            }
            term_freqs.push(freqs);
        }

        let n = chunks.len() as f32;
        let avg_doc_len = if chunks.is_empty() {
            0.0
        } else {
            doc_lens.iter().sum::<usize>() as f32 / n
        };

        // Non-negative IDF: a term present in every document weighs ~0 instead
        // of going negative, and a term in some documents always weighs > 0.
        let idf = doc_freq
            .into_iter()
            .map(|(term, df)| {
                let df = df as f32;
                (term, (1.0 + (n - df + 0.5) / (df + 0.5)).ln())
            })
            .collect();

        info!("Built lexical index over {} chunks", chunks.len());

        Self {
            chunks,
            term_freqs,
            doc_lens,
            avg_doc_len,
            idf,
            params,
        }
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }

    /// Score every chunk against `query`, in corpus order.
    ///
    /// Chunks sharing no term with the query score 0.0. An empty index yields
    /// an empty mapping, which callers treat as "index unavailable".
    pub fn score(&self, query: &str) -> IndexMap<String, f32> {
        self.raw_scores(query)
            .into_iter()
            .zip(&self.chunks)
            .map(|(score, chunk)| (chunk.id.clone(), score))
            .collect()
    }

    /// The `k` best chunks with a strictly positive score.
    ///
    /// Sorted by descending score; equal scores keep corpus order.
    pub fn top_k(&self, query: &str, k: usize) -> Vec<ScoredChunk> {
        let scores = self.raw_scores(query);

        let mut ranked: Vec<usize> = (0..scores.len()).filter(|&i| scores[i] > 0.0).collect();
        ranked.sort_by(|&a, &b| {
            scores[b]
                .partial_cmp(&scores[a])
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        let results: Vec<ScoredChunk> = ranked
            .into_iter()
            .take(k)
            .map(|i| ScoredChunk {
                chunk: self.chunks[i].clone(),
                score: scores[i],
            })
            .collect();

        debug!("Lexical search returned {} chunks", results.len());
        results
    }

    fn raw_scores(&self, query: &str) -> Vec<f32> {
        let terms = tokenize(query);
        let Bm25Params { k1, b } = self.params;
        let avg_len = if self.avg_doc_len > 0.0 { self.avg_doc_len } else { 1.0 };

        self.term_freqs
            .iter()
            .zip(&self.doc_lens)
            .map(|(freqs, &doc_len)| {
                let norm = k1 * (1.0 - b + b * doc_len as f32 / avg_len);
                terms
                    .iter()
                    .filter_map(|term| {
                        let tf = *freqs.get(term)? as f32;
                        let idf = self.idf.get(term).copied().unwrap_or(0.0);
                        Some(idf * tf * (k1 + 1.0) / (tf + norm))
                    })
                    .sum()
            })
            .collect()
    }
}

/// Published lexical index shared across concurrent checks
#[derive(Debug, Default)]
pub struct SharedLexicalIndex {
    current: RwLock<Arc<LexicalIndex>>,
}

impl SharedLexicalIndex {
    pub fn new(index: LexicalIndex) -> Self {
        Self {
            current: RwLock::new(Arc::new(index)),
        }
    }

    /// Current index; the snapshot stays valid across a concurrent publish
    pub fn snapshot(&self) -> Arc<LexicalIndex> {
        let guard = self.current.read().unwrap_or_else(|e| e.into_inner());
        Arc::clone(&guard)
    }

    /// Replace the published index with a fully built one
    pub fn publish(&self, index: LexicalIndex) {
        let index = Arc::new(index);
        let mut guard = self.current.write().unwrap_or_else(|e| e.into_inner());
        info!("Publishing lexical index: {} -> {} chunks", guard.len(), index.len());
        *guard = index;
    }

    pub fn is_available(&self) -> bool {
        !self.snapshot().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::knowledge::models::ChunkMetadata;

    fn corpus(texts: &[&str]) -> Vec<Chunk> {
        texts
            .iter()
            .enumerate()
            .map(|(i, t)| Chunk::new(format!("c{}", i), *t, ChunkMetadata::default()))
            .collect()
    }

    #[test]
    fn test_matching_chunk_ranks_first() {
        let index = LexicalIndex::build(corpus(&["the sky is blue", "the grass is green"]));
        let scores = index.score("sky blue");

        assert_eq!(scores.len(), 2);
        assert!(scores["c0"] > scores["c1"]);
        assert_eq!(scores["c1"], 0.0);
    }

    #[test]
    fn test_every_chunk_gets_a_score() {
        let index = LexicalIndex::build(corpus(&["alpha beta", "gamma", "delta epsilon"]));
        let scores = index.score("zeta");
        assert_eq!(scores.keys().collect::<Vec<_>>(), vec!["c0", "c1", "c2"]);
        assert!(scores.values().all(|&s| s == 0.0));
    }

    #[test]
    fn test_empty_corpus_scores_nothing() {
        let index = LexicalIndex::build(Vec::new());
        assert!(index.is_empty());
        assert!(index.score("anything").is_empty());
        assert!(index.top_k("anything", 5).is_empty());
    }

    #[test]
    fn test_top_k_excludes_zero_scores() {
        let index = LexicalIndex::build(corpus(&[
            "taipei power outage",
            "kaohsiung weather report",
            "taipei typhoon outage outage",
        ]));
        let hits = index.top_k("outage", 5);

        assert_eq!(hits.len(), 2);
        assert!(hits.iter().all(|h| h.score > 0.0));
        assert!(hits.iter().all(|h| h.chunk.id != "c1"));
    }

    #[test]
    fn test_top_k_truncates_and_keeps_corpus_order_on_ties() {
        let index = LexicalIndex::build(corpus(&["x y", "x y", "x y", "z"]));
        let hits = index.top_k("x", 2);
        let ids: Vec<_> = hits.iter().map(|h| h.chunk.id.as_str()).collect();
        assert_eq!(ids, vec!["c0", "c1"]);
    }

    #[test]
    fn test_case_folding() {
        let index = LexicalIndex::build(corpus(&["Rust Language", "other words"]));
        let hits = index.top_k("rust", 5);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].chunk.id, "c0");
    }

    #[test]
    fn test_scoring_is_deterministic() {
        let texts = ["a b c", "b c d", "c d e", "a a a"];
        let first = LexicalIndex::build(corpus(&texts)).score("a c");
        let second = LexicalIndex::build(corpus(&texts)).score("a c");
        assert_eq!(first, second);
    }

    #[test]
    fn test_duplicate_ids_are_dropped() {
        let chunks = vec![
            Chunk::new("same", "first", ChunkMetadata::default()),
            Chunk::new("same", "second", ChunkMetadata::default()),
        ];
        let index = LexicalIndex::build(chunks);
        assert_eq!(index.len(), 1);
        assert_eq!(index.chunks()[0].content, "first");
    }

    #[test]
    fn test_shared_index_publish_swaps_snapshot() {
        let shared = SharedLexicalIndex::new(LexicalIndex::build(Vec::new()));
        assert!(!shared.is_available());

        let old = shared.snapshot();
        shared.publish(LexicalIndex::build(corpus(&["fresh corpus"])));

        assert!(old.is_empty());
        assert!(shared.is_available());
        assert_eq!(shared.snapshot().len(), 1);
    }
}
