//! Long-lived components shared by every command.

use ragbot_core::{AppConfig, AppResult};
use ragbot_knowledge::{DocumentProcessor, LanceDbStore, RagChatbot};
use ragbot_llm::{LlmLoader, LlmSource};
use ragbot_server::ServerState;
use std::sync::Arc;

pub struct AppContext {
    pub config: AppConfig,
    pub llms: Arc<LlmLoader>,
    pub chatbot: Arc<RagChatbot>,
    pub processor: Arc<DocumentProcessor>,
}

impl AppContext {
    /// Load the LLM registry, open the vector store and build the chain.
    pub async fn build(config: AppConfig) -> AppResult<Self> {
        let llms = Arc::new(LlmLoader::from_file(&config.llm_config_path)?);
        let store = Arc::new(LanceDbStore::from_config(&config).await?);

        let source: Arc<dyn LlmSource> = llms.clone();
        let chatbot = Arc::new(RagChatbot::from_config(&config, source, store).await?);
        let processor = Arc::new(DocumentProcessor::from_config(&config)?);

        tracing::debug!(state = chatbot.state().as_str(), "Context ready");

        Ok(Self {
            config,
            llms,
            chatbot,
            processor,
        })
    }

    pub fn into_server_state(self) -> ServerState {
        ServerState::new(self.config, self.llms, self.chatbot, self.processor)
    }
}
