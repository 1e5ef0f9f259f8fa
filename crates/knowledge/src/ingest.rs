//! File ingestion: parse on the blocking pool, then index.

use crate::processor::DocumentProcessor;
use crate::rag::RagChatbot;
use ragbot_core::{AppError, AppResult};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Debug, Clone, Default, Serialize)]
pub struct IngestOutcome {
    /// (file name, chunk count)
    pub processed: Vec<(String, usize)>,

    /// (file name, error message)
    pub failed: Vec<(String, String)>,
}

impl IngestOutcome {
    pub fn total_chunks(&self) -> usize {
        self.processed.iter().map(|(_, n)| n).sum()
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}

/// Parse and index one file.
pub async fn ingest_file(
    processor: Arc<DocumentProcessor>,
    chatbot: &RagChatbot,
    path: PathBuf,
) -> AppResult<usize> {
    let chunks = tokio::task::spawn_blocking(move || processor.process_document(&path))
        .await
        .map_err(|e| AppError::Other(format!("Document processing task failed: {}", e)))??;

    chatbot.add_chunks(&chunks).await?;
    Ok(chunks.len())
}

/// Ingest each file independently; failures are collected, not returned.
pub async fn ingest_files(
    processor: Arc<DocumentProcessor>,
    chatbot: &RagChatbot,
    paths: Vec<PathBuf>,
) -> IngestOutcome {
    let mut outcome = IngestOutcome::default();

    for path in paths {
        let name = display_name(&path);
        match ingest_file(Arc::clone(&processor), chatbot, path).await {
            Ok(count) => outcome.processed.push((name, count)),
            Err(e) => {
                tracing::warn!(file = %name, error = %e, "Failed to ingest file");
                outcome.failed.push((name, e.to_string()));
            }
        }
    }

    outcome
}
