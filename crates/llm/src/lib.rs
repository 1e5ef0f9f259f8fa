//! LLM integration for ragbot.
//!
//! Provides the provider-agnostic [`LlmClient`] trait, concrete clients for
//! Ollama and OpenAI-compatible APIs (OpenAI, Groq), and the [`LlmLoader`]
//! which reads the JSON registry, resolves `ENV:` references, and caches
//! constructed clients by name.
//!
//! # Example
//! ```no_run
//! use ragbot_llm::{LlmClient, LlmLoader, LlmRequest, LlmSource};
//! use std::path::Path;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let loader = LlmLoader::from_file(Path::new("config/llm.json"))?;
//! let llm = loader.manager_llm()?;
//! let response = llm.complete(&LlmRequest::new("Hello, world!")).await?;
//! println!("{}", response.content);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod factory;
pub mod loader;
pub mod providers;
pub mod registry;
pub mod types;

// Re-export main types
pub use client::{
    LlmClient, LlmRequest, LlmResponse, LlmSource, LlmStream, LlmStreamChunk, LlmUsage,
};
pub use factory::create_client;
pub use loader::LlmLoader;
pub use providers::{OllamaClient, OpenAiCompatClient};
pub use registry::{resolve_env_values, LlmRegistry, RegistryEntry};
pub use types::{OllamaConfig, OpenAiConfig, ProviderConfig, ProviderKind};
