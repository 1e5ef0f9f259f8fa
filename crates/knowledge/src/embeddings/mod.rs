//! Text embedding for the vector store.

pub mod config;
pub mod provider;
pub mod providers;

pub use config::EmbeddingConfig;
pub use provider::{create_provider, embed_in_batches, EmbeddingProvider};
