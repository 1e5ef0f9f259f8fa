//! Ollama embedding provider.
//!
//! Sends batches to `POST /api/embed` on a local Ollama server, e.g. with
//! `all-minilm` (384 dimensions) or `nomic-embed-text` (768).
//!
//! # Example
//! ```no_run
//! use ragbot_knowledge::embeddings::{EmbeddingConfig, EmbeddingProvider};
//! use ragbot_knowledge::embeddings::providers::ollama::OllamaProvider;
//!
//! # async fn example() -> ragbot_core::AppResult<()> {
//! let provider = OllamaProvider::new(&EmbeddingConfig::default())?;
//! let embedding = provider.embed("Hello world").await?;
//! assert_eq!(embedding.len(), 384);
//! # Ok(())
//! # }
//! ```

use crate::embeddings::EmbeddingConfig;
use crate::embeddings::EmbeddingProvider;
use async_trait::async_trait;
use ragbot_core::{AppError, AppResult};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, instrument, warn};

const EMBED_ENDPOINT: &str = "/api/embed";

/// Maximum attempts per batch
const MAX_RETRIES: u32 = 3;

const INITIAL_BACKOFF_MS: u64 = 100;

const REQUEST_TIMEOUT_SECS: u64 = 60;

#[derive(Debug, Clone)]
pub struct OllamaProvider {
    client: Client,
    base_url: String,
    model: String,
    dimensions: usize,
}

#[derive(Debug, Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Debug, Deserialize)]
struct EmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: String,
}

impl OllamaProvider {
    /// Build the client. No request is made until the first embedding.
    pub fn new(config: &EmbeddingConfig) -> AppResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| {
                AppError::Embedding(format!("Failed to create HTTP client for Ollama: {}", e))
            })?;

        Ok(Self {
            client,
            base_url: config.endpoint.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            dimensions: config.dimensions,
        })
    }

    #[instrument(skip(self, texts), fields(batch_size = texts.len(), model = %self.model))]
    async fn embed_with_retries(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        let mut attempt = 0;

        loop {
            match self.embed_once(texts).await {
                Ok(embeddings) => return Ok(embeddings),
                Err(e) => {
                    attempt += 1;
                    if attempt >= MAX_RETRIES {
                        return Err(AppError::Embedding(format!(
                            "Ollama embeddings unavailable at {} after {} attempts ({}). \
                             Ensure Ollama is running and run: ollama pull {}",
                            self.base_url, attempt, e, self.model
                        )));
                    }

                    let backoff_ms = INITIAL_BACKOFF_MS * 2_u64.pow(attempt);
                    warn!(
                        "Embedding failed (attempt {}/{}), retrying in {}ms: {}",
                        attempt, MAX_RETRIES, backoff_ms, e
                    );
                    tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
                }
            }
        }
    }

    async fn embed_once(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        let url = format!("{}{}", self.base_url, EMBED_ENDPOINT);
        debug!("Sending embedding request to {}", url);

        let response = self
            .client
            .post(&url)
            .json(&EmbedRequest {
                model: &self.model,
                input: texts,
            })
            .send()
            .await
            .map_err(|e| AppError::Embedding(format!("Failed to send request to Ollama: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            let message = serde_json::from_str::<ErrorResponse>(&body)
                .map(|e| e.error)
                .unwrap_or(body);

            return Err(AppError::Embedding(format!(
                "Ollama API error ({}): {}",
                status, message
            )));
        }

        let body: EmbedResponse = response
            .json()
            .await
            .map_err(|e| AppError::Embedding(format!("Failed to parse Ollama response: {}", e)))?;

        self.check_response(texts.len(), body.embeddings)
    }

    fn check_response(&self, expected: usize, embeddings: Vec<Vec<f32>>) -> AppResult<Vec<Vec<f32>>> {
        if embeddings.len() != expected {
            return Err(AppError::Embedding(format!(
                "Ollama returned {} embeddings for {} inputs",
                embeddings.len(),
                expected
            )));
        }

        if let Some(bad) = embeddings.iter().find(|e| e.len() != self.dimensions) {
            return Err(AppError::Embedding(format!(
                "Unexpected embedding dimensions: got {}, expected {}",
                bad.len(),
                self.dimensions
            )));
        }

        Ok(embeddings)
    }
}

#[async_trait]
impl EmbeddingProvider for OllamaProvider {
    fn provider_name(&self) -> &str {
        "ollama"
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(vec![]);
        }

        self.embed_with_retries(texts).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider(endpoint: &str) -> OllamaProvider {
        OllamaProvider::new(&EmbeddingConfig {
            provider: "ollama".to_string(),
            model: "all-minilm".to_string(),
            dimensions: 3,
            endpoint: endpoint.to_string(),
            batch_size: 8,
        })
        .unwrap()
    }

    #[test]
    fn test_trailing_slash_is_trimmed() {
        assert_eq!(provider("http://localhost:11434/").base_url, "http://localhost:11434");
    }

    #[test]
    fn test_check_response_dimensions() {
        let p = provider("http://localhost:11434");
        assert!(p.check_response(1, vec![vec![0.1, 0.2, 0.3]]).is_ok());

        let err = p.check_response(1, vec![vec![0.1, 0.2]]).unwrap_err();
        assert!(err.to_string().contains("got 2, expected 3"));
    }

    #[test]
    fn test_check_response_count() {
        let p = provider("http://localhost:11434");
        let err = p.check_response(2, vec![vec![0.1, 0.2, 0.3]]).unwrap_err();
        assert!(err.to_string().contains("1 embeddings for 2 inputs"));
    }

    #[tokio::test]
    async fn test_empty_batch_makes_no_request() {
        let p = provider("http://127.0.0.1:9");
        assert!(p.embed_batch(&[]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unreachable_server_is_embedding_error() {
        let p = provider("http://127.0.0.1:9");
        let err = p.embed("hello").await.unwrap_err();
        assert!(matches!(err, AppError::Embedding(_)));
        assert!(err.to_string().contains("ollama pull all-minilm"));
    }
}
