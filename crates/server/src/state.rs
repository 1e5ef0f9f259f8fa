use ragbot_core::AppConfig;
use ragbot_knowledge::{DocumentProcessor, RagChatbot};
use ragbot_llm::LlmLoader;
use std::sync::Arc;

/// Components shared by every request.
pub struct ServerState {
    pub config: AppConfig,
    pub llms: Arc<LlmLoader>,
    pub chatbot: Arc<RagChatbot>,
    pub processor: Arc<DocumentProcessor>,
}

impl ServerState {
    pub fn new(
        config: AppConfig,
        llms: Arc<LlmLoader>,
        chatbot: Arc<RagChatbot>,
        processor: Arc<DocumentProcessor>,
    ) -> Self {
        Self {
            config,
            llms,
            chatbot,
            processor,
        }
    }
}
