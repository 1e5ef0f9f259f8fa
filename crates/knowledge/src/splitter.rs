//! Recursive character splitting with overlap.

use crate::types::{Chunk, ChunkMetadata, Document};
use ragbot_core::{AppError, AppResult};
use text_splitter::{ChunkConfig, TextSplitter};

/// Splits documents into chunks of at most `chunk_size` characters.
///
/// Boundaries prefer paragraphs, then lines, sentences and words. Each
/// chunk keeps its document's metadata plus its position within the file
/// and the byte offset where it starts.
pub struct DocumentSplitter {
    splitter: TextSplitter<text_splitter::Characters>,
    chunk_size: usize,
    chunk_overlap: usize,
}

impl DocumentSplitter {
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> AppResult<Self> {
        let config = ChunkConfig::new(chunk_size)
            .with_overlap(chunk_overlap)
            .map_err(|e| AppError::Config(format!("Invalid chunk settings: {}", e)))?;

        Ok(Self {
            splitter: TextSplitter::new(config),
            chunk_size,
            chunk_overlap,
        })
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn chunk_overlap(&self) -> usize {
        self.chunk_overlap
    }

    /// Split documents that all came from the same file.
    ///
    /// Positions run across the documents so that a CSV with many rows
    /// still yields distinct ordinals.
    pub fn split(&self, documents: &[Document]) -> Vec<Chunk> {
        let mut chunks = Vec::new();
        let mut position = 0u32;

        for doc in documents {
            for (start_index, text) in self.splitter.chunk_indices(&doc.content) {
                if text.trim().is_empty() {
                    continue;
                }

                let metadata = ChunkMetadata {
                    source: doc.metadata.source.clone(),
                    file_path: doc.metadata.file_path.clone(),
                    position,
                    start_index,
                    extra: doc.metadata.extra.clone(),
                };
                chunks.push(Chunk::new(text, metadata));
                position += 1;
            }
        }

        tracing::debug!(
            documents = documents.len(),
            chunks = chunks.len(),
            chunk_size = self.chunk_size,
            overlap = self.chunk_overlap,
            "Split documents"
        );

        chunks
    }
}
