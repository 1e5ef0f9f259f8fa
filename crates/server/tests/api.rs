//! Router-level tests with offline embeddings and an unreachable LLM.

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use ragbot_core::AppConfig;
use ragbot_knowledge::{create_provider, DocumentProcessor, EmbeddingConfig, LanceDbStore, RagChatbot};
use ragbot_llm::{LlmLoader, LlmRegistry, LlmSource};
use ragbot_server::{router, ServerState};
use serde_json::Value;
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;

const REGISTRY: &str = r#"{
  "managerLLM": "local",
  "llms": {
    "local": {
      "provider": "ollama",
      "load_on_init": false,
      "config": { "model": "llama3.2", "endpoint": "http://127.0.0.1:9" }
    }
  }
}"#;

const BOUNDARY: &str = "ragbot-test-boundary";

async fn app(temp: &TempDir) -> Router {
    let mut config = AppConfig::default();
    config.persist_directory = temp.path().join("vector_db");
    config.upload_dir = temp.path().join("uploads");
    config.embedding.provider = "hashed".to_string();
    config.embedding.model = "hashed-trigram".to_string();
    config.embedding.dimensions = 64;

    let embedding = EmbeddingConfig::from(&config.embedding);
    let embedder = create_provider(&embedding).unwrap();
    let store = Arc::new(
        LanceDbStore::open(&config.persist_directory, &config.collection_name, embedding, embedder)
            .await
            .unwrap(),
    );

    let llms = Arc::new(LlmLoader::new(LlmRegistry::from_json_str(REGISTRY).unwrap()));
    let source: Arc<dyn LlmSource> = llms.clone();
    let chatbot = Arc::new(RagChatbot::from_config(&config, source, store).await.unwrap());
    let processor = Arc::new(DocumentProcessor::from_config(&config).unwrap());

    router(Arc::new(ServerState::new(config, llms, chatbot, processor)))
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_json(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn upload(files: &[(&str, &str)]) -> Request<Body> {
    let mut body = String::new();
    for (name, content) in files {
        body.push_str(&format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"files\"; filename=\"{name}\"\r\nContent-Type: application/octet-stream\r\n\r\n{content}\r\n"
        ));
    }
    body.push_str(&format!("--{BOUNDARY}--\r\n"));

    Request::builder()
        .method("POST")
        .uri("/upload")
        .header("content-type", format!("multipart/form-data; boundary={BOUNDARY}"))
        .body(Body::from(body))
        .unwrap()
}

#[tokio::test]
async fn root_lists_endpoints() {
    let temp = TempDir::new().unwrap();
    let app = app(&temp).await;

    let (status, body) = send(&app, get("/")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["endpoints"]["chat"], "/chat");
}

#[tokio::test]
async fn status_reports_empty_store() {
    let temp = TempDir::new().unwrap();
    let app = app(&temp).await;

    let (status, body) = send(&app, get("/status")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["details"]["documents_indexed"], 0);
    assert_eq!(body["details"]["current_llm"], "local");
    assert_eq!(body["details"]["available_llms"][0], "local");
    assert_eq!(body["details"]["chain_state"], "uninitialized");
}

#[tokio::test]
async fn chat_before_upload_returns_fixed_answer() {
    let temp = TempDir::new().unwrap();
    let app = app(&temp).await;

    let (status, body) = send(&app, post_json("/chat", r#"{"question": "hi", "session_id": "abc"}"#)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["answer"].as_str().unwrap().starts_with("I don't have any documents"));
    assert_eq!(body["sources"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn malformed_chat_is_bad_request() {
    let temp = TempDir::new().unwrap();
    let app = app(&temp).await;

    let (status, body) = send(&app, post_json("/chat", r#"{"prompt": "hi"}"#)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn upload_search_and_delete() {
    let temp = TempDir::new().unwrap();
    let app = app(&temp).await;

    let (status, body) = send(
        &app,
        upload(&[
            ("hello.txt", "hello world"),
            ("notes.xyz", "unsupported"),
        ]),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Processed 1 file(s)");
    assert_eq!(body["processed"][0]["filename"], "hello.txt");
    assert_eq!(body["processed"][0]["chunks"], 1);
    assert_eq!(body["failed"][0]["filename"], "notes.xyz");
    assert!(temp.path().join("uploads").join("hello.txt").exists());

    let (_, body) = send(&app, get("/search?query=hello&k=2")).await;
    assert_eq!(body["count"], 1);
    assert_eq!(body["results"][0]["content"], "hello world");
    assert_eq!(body["results"][0]["metadata"]["source"], "hello.txt");

    let (_, body) = send(&app, get("/status")).await;
    assert_eq!(body["details"]["documents_indexed"], 1);
    assert_eq!(body["details"]["chain_state"], "ready");

    // The configured LLM is unreachable, so the turn fails gracefully
    let (status, body) = send(&app, post_json("/chat", r#"{"question": "what is here?"}"#)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["answer"].as_str().unwrap().starts_with("An error occurred: "));

    let request = Request::builder()
        .method("DELETE")
        .uri("/documents")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "success");
    assert!(!temp.path().join("uploads").join("hello.txt").exists());

    let (_, body) = send(&app, get("/status")).await;
    assert_eq!(body["details"]["documents_indexed"], 0);
}

#[tokio::test]
async fn history_and_clear() {
    let temp = TempDir::new().unwrap();
    let app = app(&temp).await;

    let (_, body) = send(&app, get("/history")).await;
    assert_eq!(body["count"], 0);

    let (status, body) = send(&app, post_json("/clear", "")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Conversation memory cleared");
}

#[tokio::test]
async fn search_requires_query() {
    let temp = TempDir::new().unwrap();
    let app = app(&temp).await;

    let (status, body) = send(&app, get("/search?k=2")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn upload_without_files_is_bad_request() {
    let temp = TempDir::new().unwrap();
    let app = app(&temp).await;

    let (status, _) = send(&app, upload(&[])).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
