//! Embedding provider trait and factory.

use crate::embeddings::config::EmbeddingConfig;
use crate::embeddings::providers::{hashed::HashedProvider, ollama::OllamaProvider};
use ragbot_core::{AppError, AppResult};
use std::sync::Arc;

/// Trait for embedding providers.
#[async_trait::async_trait]
pub trait EmbeddingProvider: Send + Sync + std::fmt::Debug {
    /// Get provider name (e.g., "ollama", "hashed")
    fn provider_name(&self) -> &str;

    /// Get model identifier
    fn model_name(&self) -> &str;

    /// Get embedding dimensions
    fn dimensions(&self) -> usize;

    /// Generate embeddings for multiple texts in a batch.
    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>>;

    /// Generate embedding for a single text (convenience method).
    async fn embed(&self, text: &str) -> AppResult<Vec<f32>> {
        let mut results = self.embed_batch(&[text.to_string()]).await?;
        results
            .pop()
            .ok_or_else(|| AppError::Embedding("No embedding returned".to_string()))
    }
}

/// Create an embedding provider based on configuration.
pub fn create_provider(config: &EmbeddingConfig) -> AppResult<Arc<dyn EmbeddingProvider>> {
    match config.provider.as_str() {
        "ollama" => Ok(Arc::new(OllamaProvider::new(config)?)),
        "hashed" => Ok(Arc::new(HashedProvider::new(config.dimensions))),
        _ => Err(AppError::Config(format!(
            "Unknown embedding provider: '{}'. Supported providers: ollama, hashed",
            config.provider
        ))),
    }
}

/// Embed `texts` in slices of `batch_size`, preserving order.
pub async fn embed_in_batches(
    provider: &dyn EmbeddingProvider,
    texts: &[String],
    batch_size: usize,
) -> AppResult<Vec<Vec<f32>>> {
    let mut vectors = Vec::with_capacity(texts.len());

    for (i, batch) in texts.chunks(batch_size.max(1)).enumerate() {
        tracing::debug!(batch = i, size = batch.len(), "Embedding batch");
        let embedded = provider.embed_batch(batch).await?;

        if embedded.len() != batch.len() {
            return Err(AppError::Embedding(format!(
                "Provider returned {} embeddings for {} texts",
                embedded.len(),
                batch.len()
            )));
        }
        vectors.extend(embedded);
    }

    Ok(vectors)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hashed_config() -> EmbeddingConfig {
        EmbeddingConfig {
            provider: "hashed".to_string(),
            model: "hashed-trigram".to_string(),
            dimensions: 64,
            endpoint: String::new(),
            batch_size: 2,
        }
    }

    #[test]
    fn test_create_hashed_provider() {
        let provider = create_provider(&hashed_config()).unwrap();
        assert_eq!(provider.provider_name(), "hashed");
        assert_eq!(provider.dimensions(), 64);
    }

    #[test]
    fn test_create_ollama_provider_does_not_connect() {
        let config = EmbeddingConfig {
            endpoint: "http://127.0.0.1:9".to_string(),
            ..EmbeddingConfig::default()
        };

        let provider = create_provider(&config).unwrap();
        assert_eq!(provider.provider_name(), "ollama");
        assert_eq!(provider.model_name(), "all-minilm");
    }

    #[test]
    fn test_create_unknown_provider() {
        let config = EmbeddingConfig {
            provider: "unknown".to_string(),
            ..hashed_config()
        };

        let err = create_provider(&config).unwrap_err();
        assert!(err.is_config());
        assert!(err.to_string().contains("Unknown embedding provider"));
    }

    #[tokio::test]
    async fn test_embed_in_batches_preserves_order() {
        let provider = create_provider(&hashed_config()).unwrap();
        let texts: Vec<String> = ["alpha", "beta", "gamma", "delta", "epsilon"]
            .iter()
            .map(|s| s.to_string())
            .collect();

        let batched = embed_in_batches(provider.as_ref(), &texts, 2).await.unwrap();
        let direct = provider.embed_batch(&texts).await.unwrap();
        assert_eq!(batched, direct);
    }

    #[tokio::test]
    async fn test_provider_embed_single() {
        let provider = create_provider(&hashed_config()).unwrap();
        let embedding = provider.embed("test text").await.unwrap();
        assert_eq!(embedding.len(), 64);
    }
}
