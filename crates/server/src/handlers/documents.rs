use std::path::{Path, PathBuf};
use std::sync::Arc;

use axum::extract::multipart::MultipartRejection;
use axum::extract::rejection::QueryRejection;
use axum::extract::{Multipart, Query, State};
use axum::response::IntoResponse;
use axum::Json;
use ragbot_knowledge::ingest_file;
use ragbot_knowledge::rag::DEFAULT_RETRIEVAL_K;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::ApiError;
use crate::state::ServerState;

const UPLOAD_FIELD: &str = "files";

/// File name without any directory components.
fn safe_file_name(raw: &str) -> Option<String> {
    Path::new(raw)
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .filter(|n| !n.is_empty() && n != "." && n != "..")
}

pub async fn upload(
    State(state): State<Arc<ServerState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let mut multipart = multipart?;
    state.config.ensure_upload_dir()?;

    let mut saved: Vec<(String, PathBuf)> = Vec::new();
    let mut failed: Vec<Value> = Vec::new();

    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }
        let raw_name = field.file_name().unwrap_or_default().to_string();
        let Some(filename) = safe_file_name(&raw_name) else {
            failed.push(json!({
                "filename": raw_name,
                "error": "Invalid file name",
                "status": "failed"
            }));
            continue;
        };

        let bytes = field.bytes().await?;
        let path = state.config.upload_dir.join(&filename);
        match tokio::fs::write(&path, &bytes).await {
            Ok(()) => saved.push((filename, path)),
            Err(e) => failed.push(json!({
                "filename": filename,
                "error": format!("Failed to save upload: {}", e),
                "status": "failed"
            })),
        }
    }

    if saved.is_empty() && failed.is_empty() {
        return Err(ApiError::BadRequest(format!(
            "No files uploaded; send multipart field '{}'",
            UPLOAD_FIELD
        )));
    }

    let mut processed = Vec::new();
    for (filename, path) in saved {
        match ingest_file(Arc::clone(&state.processor), &state.chatbot, path).await {
            Ok(chunks) => processed.push(json!({
                "filename": filename,
                "chunks": chunks,
                "status": "success"
            })),
            Err(e) => {
                tracing::warn!(file = %filename, error = %e, "Upload failed");
                failed.push(json!({
                    "filename": filename,
                    "error": e.to_string(),
                    "status": "failed"
                }));
            }
        }
    }

    state.chatbot.reinitialize().await?;

    Ok(Json(json!({
        "message": format!("Processed {} file(s)", processed.len()),
        "processed": processed,
        "failed": failed
    })))
}

pub async fn delete_all(State(state): State<Arc<ServerState>>) -> Result<impl IntoResponse, ApiError> {
    state.chatbot.delete_documents().await?;

    let upload_dir = &state.config.upload_dir;
    if upload_dir.exists() {
        tokio::fs::remove_dir_all(upload_dir)
            .await
            .map_err(ApiError::internal)?;
    }
    state.config.ensure_upload_dir()?;

    Ok(Json(json!({
        "message": "All documents deleted",
        "status": "success"
    })))
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub query: String,
    pub k: Option<usize>,
}

pub async fn search(
    State(state): State<Arc<ServerState>>,
    params: Result<Query<SearchParams>, QueryRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Query(params) = params?;
    let k = params.k.unwrap_or(DEFAULT_RETRIEVAL_K);
    if k == 0 {
        return Err(ApiError::BadRequest("k must be at least 1".to_string()));
    }

    let results = state.chatbot.relevant_documents(&params.query, k).await?;
    let formatted = results
        .iter()
        .map(|r| {
            Ok(json!({
                "content": r.chunk.text,
                "metadata": serde_json::to_value(&r.chunk.metadata).map_err(ApiError::internal)?,
                "relevance_score": r.score
            }))
        })
        .collect::<Result<Vec<_>, ApiError>>()?;

    Ok(Json(json!({
        "query": params.query,
        "count": formatted.len(),
        "results": formatted
    })))
}
