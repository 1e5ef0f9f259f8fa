//! Conversational retrieval chain.

use super::memory::ConversationMemory;
use super::types::{ChainState, ChatMessage, ChatResponse};
use crate::store::VectorIndex;
use crate::types::{Chunk, ScoredChunk};
use futures::StreamExt;
use ragbot_core::{AppConfig, AppResult};
use ragbot_llm::{LlmClient, LlmRequest, LlmSource};
use ragbot_prompt::{
    build_prompt, default_condense_prompt, default_qa_prompt, load_qa_prompt, PromptDefinition,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::Mutex as AsyncMutex;

pub const DEFAULT_RETRIEVAL_K: usize = 4;

/// Everything a turn needs before the answer is generated.
struct PreparedTurn {
    llm: Arc<dyn LlmClient>,
    request: LlmRequest,
    sources: Vec<Chunk>,
}

/// Puts the chain back to `Ready` if a turn ends while still `Responding`,
/// including when the turn's future is dropped mid-answer.
struct TurnGuard<'a> {
    state: &'a Mutex<ChainState>,
}

impl Drop for TurnGuard<'_> {
    fn drop(&mut self) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if *state == ChainState::Responding {
            *state = ChainState::Ready;
        }
    }
}

/// Answers questions from the indexed documents, remembering the conversation.
///
/// Follow-up questions are first rewritten into standalone questions using
/// the history, then the top `k` chunks for that question are stuffed into
/// the QA prompt. Turns are serialized: a second `chat` waits for the first.
pub struct RagChatbot {
    llms: Arc<dyn LlmSource>,
    store: Arc<dyn VectorIndex>,
    qa_prompt: PromptDefinition,
    condense_prompt: PromptDefinition,
    retrieval_k: usize,
    state: Mutex<ChainState>,
    memory: AsyncMutex<ConversationMemory>,
}

impl RagChatbot {
    pub fn new(
        llms: Arc<dyn LlmSource>,
        store: Arc<dyn VectorIndex>,
        retrieval_k: usize,
        memory_max_tokens: usize,
    ) -> Self {
        Self {
            llms,
            store,
            qa_prompt: default_qa_prompt(),
            condense_prompt: default_condense_prompt(),
            retrieval_k,
            state: Mutex::new(ChainState::Uninitialized),
            memory: AsyncMutex::new(ConversationMemory::new(memory_max_tokens)),
        }
    }

    /// Build from config (retrieval k, memory budget, prompt override) and
    /// evaluate readiness against the store.
    pub async fn from_config(
        config: &AppConfig,
        llms: Arc<dyn LlmSource>,
        store: Arc<dyn VectorIndex>,
    ) -> AppResult<Self> {
        let qa_prompt = load_qa_prompt(config.prompt_file.as_deref())?;
        let chatbot = Self::new(llms, store, config.retrieval_k, config.memory_max_tokens)
            .with_qa_prompt(qa_prompt);
        chatbot.initialize().await?;
        Ok(chatbot)
    }

    pub fn with_qa_prompt(mut self, prompt: PromptDefinition) -> Self {
        self.qa_prompt = prompt;
        self
    }

    pub fn store(&self) -> &Arc<dyn VectorIndex> {
        &self.store
    }

    pub fn retrieval_k(&self) -> usize {
        self.retrieval_k
    }

    pub fn state(&self) -> ChainState {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn set_state(&self, state: ChainState) {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner) = state;
    }

    /// Ready when the store holds at least one chunk.
    pub async fn initialize(&self) -> AppResult<ChainState> {
        let count = self.store.collection_count().await?;
        let state = if count == 0 {
            tracing::warn!("No documents indexed yet; chat is unavailable until documents are added");
            ChainState::Uninitialized
        } else {
            tracing::info!(documents = count, "Chain ready");
            ChainState::Ready
        };

        self.set_state(state);
        Ok(state)
    }

    pub async fn reinitialize(&self) -> AppResult<ChainState> {
        self.initialize().await
    }

    /// One chat turn. Failures are reported in the answer text, never as `Err`.
    pub async fn chat(&self, question: &str) -> ChatResponse {
        let mut memory = self.memory.lock().await;
        let _guard = TurnGuard { state: &self.state };

        let turn = match self.begin_turn(question, &memory).await {
            Ok(Some(turn)) => turn,
            Ok(None) => return ChatResponse::no_documents(),
            Err(e) => return self.fail_turn(e),
        };

        match turn.llm.complete(&turn.request).await {
            Ok(response) => {
                let answer = response.content.trim().to_string();
                memory.add_exchange(question, &answer);
                self.set_state(ChainState::Ready);
                ChatResponse {
                    answer,
                    source_documents: turn.sources,
                }
            }
            Err(e) => self.fail_turn(e),
        }
    }

    /// Like [`RagChatbot::chat`], but hands each generated fragment to
    /// `on_token` as it arrives.
    pub async fn chat_stream<F>(&self, question: &str, mut on_token: F) -> ChatResponse
    where
        F: FnMut(&str) + Send,
    {
        let mut memory = self.memory.lock().await;
        let _guard = TurnGuard { state: &self.state };

        let turn = match self.begin_turn(question, &memory).await {
            Ok(Some(turn)) => turn,
            Ok(None) => {
                let response = ChatResponse::no_documents();
                on_token(&response.answer);
                return response;
            }
            Err(e) => return self.fail_turn(e),
        };

        let request = turn.request.with_streaming();
        let mut stream = match turn.llm.stream(&request).await {
            Ok(stream) => stream,
            Err(e) => return self.fail_turn(e),
        };

        let mut answer = String::new();
        while let Some(item) = stream.next().await {
            match item {
                Ok(chunk) => {
                    if !chunk.content.is_empty() {
                        on_token(&chunk.content);
                        answer.push_str(&chunk.content);
                    }
                    if chunk.done {
                        break;
                    }
                }
                Err(e) => return self.fail_turn(e),
            }
        }

        let answer = answer.trim().to_string();
        memory.add_exchange(question, &answer);
        self.set_state(ChainState::Ready);

        ChatResponse {
            answer,
            source_documents: turn.sources,
        }
    }

    /// Readiness check, question condensing, retrieval and prompt rendering.
    ///
    /// `Ok(None)` means there is nothing to answer from.
    async fn begin_turn(
        &self,
        question: &str,
        memory: &ConversationMemory,
    ) -> AppResult<Option<PreparedTurn>> {
        if self.state() == ChainState::Uninitialized
            && self.initialize().await? == ChainState::Uninitialized
        {
            return Ok(None);
        }

        self.set_state(ChainState::Responding);
        tracing::info!(question_len = question.len(), "Chat turn");

        let llm = self.llms.manager_llm()?;
        let chat_history = memory.render();

        let standalone = if memory.is_empty() {
            question.to_string()
        } else {
            self.condense_question(llm.as_ref(), &chat_history, question)
                .await?
        };

        let sources = self
            .store
            .similarity_search(&standalone, self.retrieval_k, None)
            .await?;
        tracing::debug!(sources = sources.len(), "Retrieved context");

        let context = sources
            .iter()
            .map(|c| c.text.as_str())
            .collect::<Vec<_>>()
            .join("\n\n");

        let mut vars = HashMap::new();
        vars.insert("context".to_string(), context);
        vars.insert("chat_history".to_string(), chat_history);
        vars.insert("question".to_string(), standalone);
        let built = build_prompt(&self.qa_prompt, vars)?;

        let mut request = LlmRequest::new(built.user);
        if let Some(system) = built.system {
            request = request.with_system(system);
        }

        Ok(Some(PreparedTurn {
            llm,
            request,
            sources,
        }))
    }

    async fn condense_question(
        &self,
        llm: &dyn LlmClient,
        chat_history: &str,
        question: &str,
    ) -> AppResult<String> {
        let mut vars = HashMap::new();
        vars.insert("chat_history".to_string(), chat_history.to_string());
        vars.insert("question".to_string(), question.to_string());
        let built = build_prompt(&self.condense_prompt, vars)?;

        let response = llm.complete(&LlmRequest::new(built.user)).await?;
        let standalone = response.content.trim();

        tracing::debug!(standalone = %standalone, "Condensed follow-up question");

        if standalone.is_empty() {
            Ok(question.to_string())
        } else {
            Ok(standalone.to_string())
        }
    }

    fn fail_turn(&self, error: ragbot_core::AppError) -> ChatResponse {
        tracing::error!(error = %error, "Chat turn failed");
        if self.state() == ChainState::Responding {
            self.set_state(ChainState::Ready);
        }
        ChatResponse::from_error(&error)
    }

    pub async fn history(&self) -> Vec<ChatMessage> {
        self.memory.lock().await.messages()
    }

    pub async fn clear_memory(&self) {
        self.memory.lock().await.clear();
        tracing::info!("Conversation memory cleared");
    }

    /// Index chunks, then re-evaluate readiness.
    pub async fn add_chunks(&self, chunks: &[Chunk]) -> AppResult<Vec<String>> {
        let ids = self.store.add_chunks(chunks).await?;
        self.reinitialize().await?;
        Ok(ids)
    }

    /// Drop every indexed chunk; the chain returns to uninitialized.
    pub async fn delete_documents(&self) -> AppResult<()> {
        self.store.delete_collection().await?;
        self.reinitialize().await?;
        Ok(())
    }

    /// Scored retrieval without generating an answer.
    pub async fn relevant_documents(&self, query: &str, k: usize) -> AppResult<Vec<ScoredChunk>> {
        self.store.similarity_search_with_score(query, k, None).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embeddings::{create_provider, EmbeddingConfig};
    use crate::rag::types::{Role, NO_DOCUMENTS_ANSWER};
    use crate::store::LanceDbStore;
    use crate::types::ChunkMetadata;
    use async_trait::async_trait;
    use ragbot_core::AppError;
    use ragbot_llm::{LlmResponse, LlmStream, LlmStreamChunk, LlmUsage};
    use serde_json::Map;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    /// Replies with fixed answers in order and records every prompt.
    struct ScriptedClient {
        replies: Mutex<Vec<String>>,
        prompts: Mutex<Vec<String>>,
        calls: AtomicUsize,
        fail: bool,
    }

    impl ScriptedClient {
        fn new(replies: &[&str]) -> Arc<Self> {
            Arc::new(Self {
                replies: Mutex::new(replies.iter().rev().map(|s| s.to_string()).collect()),
                prompts: Mutex::new(Vec::new()),
                calls: AtomicUsize::new(0),
                fail: false,
            })
        }

        fn failing() -> Arc<Self> {
            Arc::new(Self {
                replies: Mutex::new(Vec::new()),
                prompts: Mutex::new(Vec::new()),
                calls: AtomicUsize::new(0),
                fail: true,
            })
        }

        fn next_reply(&self, request: &LlmRequest) -> AppResult<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.prompts.lock().unwrap().push(request.prompt.clone());
            if self.fail {
                return Err(AppError::Llm("connection refused".to_string()));
            }
            Ok(self.replies.lock().unwrap().pop().unwrap_or_default())
        }
    }

    #[async_trait]
    impl LlmClient for ScriptedClient {
        fn provider_name(&self) -> &str {
            "scripted"
        }

        fn model_name(&self) -> &str {
            "scripted-1"
        }

        async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse> {
            Ok(LlmResponse {
                content: self.next_reply(request)?,
                model: "scripted-1".to_string(),
                usage: LlmUsage::default(),
                done: true,
            })
        }

        async fn stream(&self, request: &LlmRequest) -> AppResult<LlmStream> {
            let reply = self.next_reply(request)?;
            let pieces: Vec<AppResult<LlmStreamChunk>> = reply
                .split_inclusive(' ')
                .map(|piece| {
                    Ok(LlmStreamChunk {
                        content: piece.to_string(),
                        model: "scripted-1".to_string(),
                        done: false,
                        usage: None,
                    })
                })
                .collect();
            Ok(Box::pin(futures::stream::iter(pieces)))
        }
    }

    async fn store(dir: &TempDir) -> Arc<LanceDbStore> {
        let embedding = EmbeddingConfig {
            provider: "hashed".to_string(),
            model: "hashed-trigram".to_string(),
            dimensions: 64,
            endpoint: String::new(),
            batch_size: 16,
        };
        let embedder = create_provider(&embedding).unwrap();
        Arc::new(
            LanceDbStore::open(dir.path(), "docs", embedding, embedder)
                .await
                .unwrap(),
        )
    }

    fn chatbot(client: Arc<ScriptedClient>, store: Arc<LanceDbStore>) -> RagChatbot {
        let client: Arc<dyn LlmClient> = client;
        RagChatbot::new(Arc::new(client), store, 2, 3000)
    }

    fn chunk(text: &str) -> Chunk {
        Chunk::new(
            text,
            ChunkMetadata {
                source: "policy.txt".to_string(),
                file_path: "uploads/policy.txt".to_string(),
                position: 0,
                start_index: 0,
                extra: Map::new(),
            },
        )
    }

    #[tokio::test]
    async fn test_chat_without_documents_skips_llm() {
        let temp = TempDir::new().unwrap();
        let client = ScriptedClient::new(&["should not be used"]);
        let bot = chatbot(client.clone(), store(&temp).await);

        let response = bot.chat("Anyone there?").await;
        assert_eq!(response.answer, NO_DOCUMENTS_ANSWER);
        assert!(response.source_documents.is_empty());
        assert_eq!(client.calls.load(Ordering::SeqCst), 0);
        assert_eq!(bot.state(), ChainState::Uninitialized);
        assert!(bot.history().await.is_empty());
    }

    #[tokio::test]
    async fn test_chat_answers_from_context() {
        let temp = TempDir::new().unwrap();
        let client = ScriptedClient::new(&["Returns are accepted for 30 days."]);
        let bot = chatbot(client.clone(), store(&temp).await);

        bot.add_chunks(&[chunk("Returns are accepted within 30 days of purchase.")])
            .await
            .unwrap();
        assert_eq!(bot.state(), ChainState::Ready);

        let response = bot.chat("How long do I have to return items?").await;
        assert_eq!(response.answer, "Returns are accepted for 30 days.");
        assert_eq!(response.source_documents.len(), 1);
        assert_eq!(bot.state(), ChainState::Ready);

        let prompt = client.prompts.lock().unwrap()[0].clone();
        assert!(prompt.contains("Returns are accepted within 30 days of purchase."));
        assert!(prompt.contains("Question: How long do I have to return items?"));

        let history = bot.history().await;
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].role, Role::User);
        assert_eq!(history[1].content, "Returns are accepted for 30 days.");
    }

    #[tokio::test]
    async fn test_follow_up_is_condensed() {
        let temp = TempDir::new().unwrap();
        let client = ScriptedClient::new(&[
            "Thirty days.",
            "What is the return window for electronics?",
            "Electronics also get thirty days.",
        ]);
        let bot = chatbot(client.clone(), store(&temp).await);
        bot.add_chunks(&[chunk("Returns are accepted within 30 days, electronics included.")])
            .await
            .unwrap();

        bot.chat("What is the return window?").await;
        let response = bot.chat("And for electronics?").await;

        assert_eq!(response.answer, "Electronics also get thirty days.");
        assert_eq!(client.calls.load(Ordering::SeqCst), 3);

        let prompts = client.prompts.lock().unwrap();
        assert!(prompts[1].contains("Human: What is the return window?"));
        assert!(prompts[1].contains("Follow Up Input: And for electronics?"));
        assert!(prompts[2].contains("Question: What is the return window for electronics?"));
    }

    #[tokio::test]
    async fn test_llm_failure_becomes_answer() {
        let temp = TempDir::new().unwrap();
        let bot = chatbot(ScriptedClient::failing(), store(&temp).await);
        bot.add_chunks(&[chunk("Some indexed text.")]).await.unwrap();

        let response = bot.chat("Question?").await;
        assert!(response.answer.starts_with("An error occurred: "));
        assert!(response.answer.contains("connection refused"));
        assert!(response.source_documents.is_empty());
        assert!(bot.history().await.is_empty());
        assert_eq!(bot.state(), ChainState::Ready);
    }

    #[tokio::test]
    async fn test_chat_stream_emits_tokens() {
        let temp = TempDir::new().unwrap();
        let client = ScriptedClient::new(&["Thirty days total."]);
        let bot = chatbot(client, store(&temp).await);
        bot.add_chunks(&[chunk("Returns are accepted within 30 days.")])
            .await
            .unwrap();

        let mut tokens = Vec::new();
        let response = bot
            .chat_stream("Return window?", |t| tokens.push(t.to_string()))
            .await;

        assert_eq!(tokens, vec!["Thirty ", "days ", "total."]);
        assert_eq!(response.answer, "Thirty days total.");
        assert_eq!(bot.history().await.len(), 2);
    }

    #[tokio::test]
    async fn test_clear_memory_keeps_documents() {
        let temp = TempDir::new().unwrap();
        let client = ScriptedClient::new(&["An answer."]);
        let bot = chatbot(client, store(&temp).await);
        bot.add_chunks(&[chunk("Indexed text.")]).await.unwrap();
        bot.chat("Question?").await;

        bot.clear_memory().await;
        assert!(bot.history().await.is_empty());
        assert_eq!(bot.store().collection_count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_delete_documents_uninitializes() {
        let temp = TempDir::new().unwrap();
        let bot = chatbot(ScriptedClient::new(&[]), store(&temp).await);
        bot.add_chunks(&[chunk("Indexed text.")]).await.unwrap();

        bot.delete_documents().await.unwrap();
        assert_eq!(bot.state(), ChainState::Uninitialized);
        assert_eq!(bot.chat("Anything?").await.answer, NO_DOCUMENTS_ANSWER);
    }

    #[tokio::test]
    async fn test_relevant_documents_scored() {
        let temp = TempDir::new().unwrap();
        let bot = chatbot(ScriptedClient::new(&[]), store(&temp).await);
        bot.add_chunks(&[
            chunk("Shipping takes two business days."),
            chunk("Our office cat is named Biscuit."),
        ])
        .await
        .unwrap();

        let results = bot.relevant_documents("shipping business days", 2).await.unwrap();
        assert_eq!(results.len(), 2);
        assert!(results[0].chunk.text.contains("Shipping"));
        assert!(results[0].score >= results[1].score);
    }

    /// Never finishes a completion.
    struct StalledClient;

    #[async_trait]
    impl LlmClient for StalledClient {
        fn provider_name(&self) -> &str {
            "stalled"
        }

        fn model_name(&self) -> &str {
            "stalled-1"
        }

        async fn complete(&self, _request: &LlmRequest) -> AppResult<LlmResponse> {
            futures::future::pending().await
        }

        async fn stream(&self, _request: &LlmRequest) -> AppResult<LlmStream> {
            futures::future::pending().await
        }
    }

    #[tokio::test]
    async fn test_dropped_turn_returns_to_ready() {
        let temp = TempDir::new().unwrap();
        let client: Arc<dyn LlmClient> = Arc::new(StalledClient);
        let bot = RagChatbot::new(Arc::new(client), store(&temp).await, 2, 3000);
        bot.add_chunks(&[chunk("Indexed text.")]).await.unwrap();

        let turn = tokio::time::timeout(std::time::Duration::from_millis(50), bot.chat("Question?"));
        assert!(turn.await.is_err());
        assert_eq!(bot.state(), ChainState::Ready);

        let turn = tokio::time::timeout(
            std::time::Duration::from_millis(50),
            bot.chat_stream("Question?", |_| {}),
        );
        assert!(turn.await.is_err());
        assert_eq!(bot.state(), ChainState::Ready);
        assert!(bot.history().await.is_empty());
    }
}
