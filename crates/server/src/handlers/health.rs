use std::sync::Arc;

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use ragbot_knowledge::supported_extensions;
use serde_json::json;

use crate::error::ApiError;
use crate::state::ServerState;

pub async fn root() -> impl IntoResponse {
    Json(json!({
        "message": "RAG Chatbot API",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "upload": "/upload",
            "chat": "/chat",
            "history": "/history",
            "clear": "/clear",
            "status": "/status",
            "search": "/search",
            "documents": "/documents"
        }
    }))
}

pub async fn status(State(state): State<Arc<ServerState>>) -> Result<impl IntoResponse, ApiError> {
    let documents_indexed = state.chatbot.store().collection_count().await?;

    Ok(Json(json!({
        "status": "healthy",
        "message": "System is operational",
        "details": {
            "documents_indexed": documents_indexed,
            "available_llms": state.llms.list_available_llms(),
            "current_llm": state.llms.manager_name(),
            "supported_formats": supported_extensions(),
            "chain_state": state.chatbot.state().as_str()
        }
    })))
}
