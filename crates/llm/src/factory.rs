//! LLM provider factory.
//!
//! Maps a typed provider configuration to its client implementation.

use crate::client::LlmClient;
use crate::providers::{OllamaClient, OpenAiCompatClient};
use crate::types::ProviderConfig;
use ragbot_core::AppResult;
use std::sync::Arc;

/// Create an LLM client for a resolved provider configuration.
///
/// # Errors
/// Returns a configuration error when required settings (such as an API
/// key) are empty, or an LLM error when the HTTP client cannot be built.
pub fn create_client(config: &ProviderConfig) -> AppResult<Arc<dyn LlmClient>> {
    let client: Arc<dyn LlmClient> = match config {
        ProviderConfig::Ollama(cfg) => Arc::new(OllamaClient::from_config(cfg)?),
        ProviderConfig::OpenAi(cfg) | ProviderConfig::Groq(cfg) => {
            Arc::new(OpenAiCompatClient::from_config(config.kind(), cfg)?)
        }
    };

    tracing::debug!(
        provider = client.provider_name(),
        model = client.model_name(),
        "Created LLM client"
    );

    Ok(client)
}
