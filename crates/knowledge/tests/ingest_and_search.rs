//! End-to-end: files on disk to retrievable chunks, with offline embeddings.

use ragbot_core::AppResult;
use ragbot_knowledge::embeddings::providers::hashed::HASHED_MODEL;
use ragbot_knowledge::{
    create_provider, ingest_files, DocumentProcessor, EmbeddingConfig, LanceDbStore, RagChatbot,
    VectorIndex,
};
use ragbot_llm::{
    LlmClient, LlmRequest, LlmResponse, LlmSource, LlmStream, LlmStreamChunk, LlmUsage,
};
use std::fs;
use std::sync::Arc;
use tempfile::TempDir;

struct EchoClient;

#[async_trait::async_trait]
impl LlmClient for EchoClient {
    fn provider_name(&self) -> &str {
        "echo"
    }

    fn model_name(&self) -> &str {
        "echo"
    }

    async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse> {
        Ok(LlmResponse {
            content: format!("echo: {}", request.prompt.len()),
            model: "echo".to_string(),
            usage: LlmUsage::default(),
            done: true,
        })
    }

    async fn stream(&self, _request: &LlmRequest) -> AppResult<LlmStream> {
        Ok(Box::pin(futures::stream::empty::<AppResult<LlmStreamChunk>>()))
    }
}

async fn open_store(dir: &TempDir) -> Arc<LanceDbStore> {
    let embedding = EmbeddingConfig {
        provider: "hashed".to_string(),
        model: HASHED_MODEL.to_string(),
        dimensions: 128,
        endpoint: String::new(),
        batch_size: 8,
    };
    let embedder = create_provider(&embedding).unwrap();
    Arc::new(
        LanceDbStore::open(&dir.path().join("vector_db"), "rag_documents", embedding, embedder)
            .await
            .unwrap(),
    )
}

#[tokio::test]
async fn hello_world_is_retrievable() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("hello.txt");
    fs::write(&path, "hello world").unwrap();

    let processor = DocumentProcessor::new(1000, 200).unwrap();
    let chunks = processor.process_document(&path).unwrap();
    assert_eq!(chunks.len(), 1);

    let store = open_store(&temp).await;
    let ids = store.add_chunks(&chunks).await.unwrap();
    assert_eq!(ids.len(), 1);

    let results = store.similarity_search("hello", 4, None).await.unwrap();
    assert!(!results.is_empty());
    assert_eq!(results[0].text, "hello world");
    assert_eq!(results[0].metadata.source, "hello.txt");
}

#[tokio::test]
async fn ingest_mixed_files_isolates_failures() {
    let temp = TempDir::new().unwrap();
    let docs = temp.path().join("docs");
    fs::create_dir(&docs).unwrap();
    fs::write(docs.join("faq.txt"), "Support hours are nine to five on weekdays.").unwrap();
    fs::write(
        docs.join("pricing.csv"),
        "plan,price\nBasic,10\nPro,25\n",
    )
    .unwrap();
    fs::write(
        docs.join("about.html"),
        "<html><head><title>About</title></head><body><p>Founded in 2019.</p></body></html>",
    )
    .unwrap();
    fs::write(docs.join("broken.docx"), "not really a docx").unwrap();

    let store = open_store(&temp).await;
    let client: Arc<dyn LlmClient> = Arc::new(EchoClient);
    let llms: Arc<dyn LlmSource> = Arc::new(client);
    let chatbot = RagChatbot::new(llms, store.clone(), 4, 3000);

    let paths = DocumentProcessor::discover(&docs, false).unwrap();
    assert_eq!(paths.len(), 4);

    let processor = Arc::new(DocumentProcessor::new(1000, 200).unwrap());
    let outcome = ingest_files(processor, &chatbot, paths).await;

    assert_eq!(outcome.processed.len(), 3);
    assert_eq!(outcome.failed.len(), 1);
    assert_eq!(outcome.failed[0].0, "broken.docx");
    assert_eq!(outcome.total_chunks(), 4);
    assert_eq!(store.collection_count().await.unwrap(), 4);

    let hits = chatbot.relevant_documents("support hours weekdays", 1).await.unwrap();
    assert_eq!(hits[0].chunk.metadata.source, "faq.txt");

    let response = chatbot.chat("When is support available?").await;
    assert!(response.answer.starts_with("echo: "));
    assert!(!response.source_documents.is_empty());
}
