//! Knowledge-base inspection summaries

use super::models::Chunk;
use indexmap::IndexMap;
use serde::Serialize;

const PREVIEW_CHARS: usize = 120;

#[derive(Debug, Clone, Serialize)]
pub struct ChunkPreview {
    pub id: String,
    pub source: String,
    pub title: String,
    pub url: String,
    pub preview: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct KnowledgeBaseSummary {
    pub total_chunks: usize,
    /// Chunk counts per source, in first-seen order
    pub per_source: IndexMap<String, usize>,
    pub entries: Vec<ChunkPreview>,
}

/// Summarize a corpus, listing at most `limit` entries
pub fn summarize(chunks: &[Chunk], limit: usize) -> KnowledgeBaseSummary {
    let mut per_source: IndexMap<String, usize> = IndexMap::new();
    for chunk in chunks {
        *per_source.entry(chunk.metadata.source.clone()).or_default() += 1;
    }

    let entries = chunks
        .iter()
        .take(limit)
        .map(|chunk| ChunkPreview {
            id: chunk.id.clone(),
            source: chunk.metadata.source.clone(),
            title: chunk.metadata.title.clone(),
            url: chunk.metadata.url.clone(),
            preview: preview(&chunk.content),
        })
        .collect();

    KnowledgeBaseSummary {
        total_chunks: chunks.len(),
        per_source,
        entries,
    }
}

fn preview(content: &str) -> String {
    if content.chars().count() <= PREVIEW_CHARS {
        return content.to_string();
    }
    let mut cut: String = content.chars().take(PREVIEW_CHARS).collect();
    cut.push('…');
    cut
}
