use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use ragbot_knowledge::Chunk;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::error::ApiError;
use crate::state::ServerState;

/// Characters of each source chunk echoed back with an answer.
const SOURCE_PREVIEW_CHARS: usize = 200;

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub question: String,
    /// Accepted for client compatibility; all requests share one conversation
    #[serde(default)]
    pub session_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SourcePreview {
    pub content: String,
    pub metadata: serde_json::Value,
}

#[derive(Debug, Serialize)]
pub struct ChatReply {
    pub answer: String,
    pub sources: Vec<SourcePreview>,
}

fn preview(chunk: &Chunk) -> Result<SourcePreview, ApiError> {
    let content = if chunk.text.chars().count() > SOURCE_PREVIEW_CHARS {
        let head: String = chunk.text.chars().take(SOURCE_PREVIEW_CHARS).collect();
        format!("{}...", head)
    } else {
        chunk.text.clone()
    };

    Ok(SourcePreview {
        content,
        metadata: serde_json::to_value(&chunk.metadata).map_err(ApiError::internal)?,
    })
}

pub async fn chat(
    State(state): State<Arc<ServerState>>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(request) = payload?;
    let question = request.question.trim();
    if question.is_empty() {
        return Err(ApiError::BadRequest("question must not be empty".to_string()));
    }

    tracing::info!(session_id = ?request.session_id, "Chat request");

    let response = state.chatbot.chat(question).await;
    let sources = response
        .source_documents
        .iter()
        .map(preview)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Json(ChatReply {
        answer: response.answer,
        sources,
    }))
}

pub async fn history(State(state): State<Arc<ServerState>>) -> impl IntoResponse {
    let history = state.chatbot.history().await;
    let count = history.len();
    Json(json!({ "history": history, "count": count }))
}

pub async fn clear(State(state): State<Arc<ServerState>>) -> impl IntoResponse {
    state.chatbot.clear_memory().await;
    Json(json!({
        "message": "Conversation memory cleared",
        "status": "success"
    }))
}
