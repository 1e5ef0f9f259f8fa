//! Document, chunk and search result types.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::Path;

/// Text loaded from a file, or from one unit of a file (a CSV row, a sheet).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Document {
    pub content: String,
    pub metadata: DocumentMetadata,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DocumentMetadata {
    /// File name without directories
    pub source: String,

    /// Path the document was loaded from
    pub file_path: String,

    /// Loader-specific keys (`row`, `sheet`, `title`, ...)
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl DocumentMetadata {
    pub fn for_path(path: &Path) -> Self {
        let source = path
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_else(|| path.to_string_lossy().to_string());

        Self {
            source,
            file_path: path.to_string_lossy().to_string(),
            extra: Map::new(),
        }
    }

    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.extra.insert(key.to_string(), value.into());
        self
    }
}

impl Document {
    pub fn new(content: impl Into<String>, metadata: DocumentMetadata) -> Self {
        Self {
            content: content.into(),
            metadata,
        }
    }
}

/// A bounded span of document text; the unit of embedding and retrieval.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Chunk {
    pub id: String,
    pub text: String,
    pub metadata: ChunkMetadata,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChunkMetadata {
    pub source: String,

    pub file_path: String,

    /// Ordinal of the chunk within its file
    pub position: u32,

    /// Byte offset of the chunk in the loaded document text
    pub start_index: usize,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Chunk {
    pub fn new(text: impl Into<String>, metadata: ChunkMetadata) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            text: text.into(),
            metadata,
        }
    }
}

/// A chunk returned from similarity search with its cosine similarity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredChunk {
    pub chunk: Chunk,

    /// Higher is more relevant; 1.0 is an exact direction match
    pub score: f32,
}

/// Result of processing several files.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchOutcome {
    pub chunks: Vec<Chunk>,

    /// (path, chunk count) for each successfully processed file
    pub processed: Vec<(String, usize)>,

    /// (path, error message) for each failed file
    pub failed: Vec<(String, String)>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metadata_for_path_uses_file_name() {
        let meta = DocumentMetadata::for_path(Path::new("/tmp/uploads/report.pdf"));
        assert_eq!(meta.source, "report.pdf");
        assert_eq!(meta.file_path, "/tmp/uploads/report.pdf");
    }

    #[test]
    fn test_extra_metadata_is_flattened() {
        let meta = DocumentMetadata::for_path(Path::new("data.csv")).with("row", 3);
        let json = serde_json::to_value(&meta).unwrap();
        assert_eq!(json["source"], "data.csv");
        assert_eq!(json["row"], 3);
    }

    #[test]
    fn test_chunk_ids_are_unique() {
        let meta = ChunkMetadata {
            source: "a.txt".to_string(),
            file_path: "a.txt".to_string(),
            position: 0,
            start_index: 0,
            extra: Map::new(),
        };
        let a = Chunk::new("same", meta.clone());
        let b = Chunk::new("same", meta);
        assert_ne!(a.id, b.id);
    }
}
