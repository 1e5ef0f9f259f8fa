//! Persisted vector store for document chunks.

mod filter;
mod lance;

pub use filter::MetadataFilter;
pub use lance::LanceDbStore;

use crate::types::{Chunk, ScoredChunk};
use async_trait::async_trait;
use ragbot_core::AppResult;

/// Vector storage and similarity search over chunks.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Name of the collection this index reads and writes.
    fn collection_name(&self) -> &str;

    /// Embed and append chunks; returns their ids in input order.
    ///
    /// An empty slice is not an error and writes nothing.
    async fn add_chunks(&self, chunks: &[Chunk]) -> AppResult<Vec<String>>;

    /// The `k` chunks nearest to `query`, most relevant first.
    ///
    /// Scores are cosine similarities. An empty index yields no results.
    async fn similarity_search_with_score(
        &self,
        query: &str,
        k: usize,
        filter: Option<&MetadataFilter>,
    ) -> AppResult<Vec<ScoredChunk>>;

    async fn similarity_search(
        &self,
        query: &str,
        k: usize,
        filter: Option<&MetadataFilter>,
    ) -> AppResult<Vec<Chunk>> {
        let scored = self.similarity_search_with_score(query, k, filter).await?;
        Ok(scored.into_iter().map(|s| s.chunk).collect())
    }

    /// Number of chunks stored; 0 when the collection does not exist.
    async fn collection_count(&self) -> AppResult<usize>;

    async fn is_empty(&self) -> AppResult<bool> {
        Ok(self.collection_count().await? == 0)
    }

    /// Names of every collection under the persist directory.
    async fn list_collections(&self) -> AppResult<Vec<String>>;

    /// Remove the collection and its files. The next add recreates it.
    async fn delete_collection(&self) -> AppResult<()>;
}

/// Cosine similarity; 0.0 for mismatched lengths or zero vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot / (norm_a * norm_b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cosine_similarity() {
        assert!((cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < 1e-6);
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-6);
        assert!((cosine_similarity(&[1.0, 0.0], &[-1.0, 0.0]) + 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_similarity_degenerate() {
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 2.0]), 0.0);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 2.0]), 0.0);
    }
}
