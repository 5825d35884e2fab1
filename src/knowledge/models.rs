//! Data models for knowledge-base chunks

use serde::{Deserialize, Serialize};

/// Provenance attached to every chunk
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkMetadata {
    #[serde(default = "default_source")]
    pub source: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub scraped_at: String,
    #[serde(default)]
    pub publication_date: String,
}

fn default_source() -> String {
    "unknown".to_string()
}

impl Default for ChunkMetadata {
    fn default() -> Self {
        Self {
            source: default_source(),
            url: String::new(),
            title: String::new(),
            scraped_at: String::new(),
            publication_date: String::new(),
        }
    }
}

impl ChunkMetadata {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            ..Default::default()
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    pub fn with_publication_date(mut self, date: impl Into<String>) -> Self {
        self.publication_date = date.into();
        self
    }

    /// Publication date as rendered into alignment prompts
    pub fn publication_date_or_na(&self) -> &str {
        let date = self.publication_date.trim();
        if date.is_empty() {
            "N/A"
        } else {
            date
        }
    }
}

/// Indexed unit of text. Immutable once indexed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    pub id: String,
    pub content: String,
    #[serde(default)]
    pub metadata: ChunkMetadata,
}

impl Chunk {
    pub fn new(id: impl Into<String>, content: impl Into<String>, metadata: ChunkMetadata) -> Self {
        Self {
            id: id.into(),
            content: content.into(),
            metadata,
        }
    }
}

/// Chunk paired with its lexical relevance score
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredChunk {
    pub chunk: Chunk,
    pub score: f32,
}
