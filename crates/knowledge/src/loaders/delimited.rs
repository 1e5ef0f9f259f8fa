//! CSV files: one document per row, rendered as `header: value` lines.

use crate::types::{Document, DocumentMetadata};
use ragbot_core::{AppError, AppResult};
use std::path::Path;

pub(super) fn load(path: &Path) -> AppResult<Vec<Document>> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .map_err(|e| AppError::Knowledge(format!("Failed to open CSV {}: {}", path.display(), e)))?;

    let headers = reader
        .headers()
        .map_err(|e| AppError::Knowledge(format!("Failed to read CSV header: {}", e)))?
        .clone();

    let mut documents = Vec::new();
    for (row, record) in reader.records().enumerate() {
        let record = record
            .map_err(|e| AppError::Knowledge(format!("Malformed CSV row {}: {}", row, e)))?;

        let content = record
            .iter()
            .enumerate()
            .map(|(i, value)| {
                let header = headers.get(i).unwrap_or("");
                format!("{}: {}", header.trim(), value.trim())
            })
            .collect::<Vec<_>>()
            .join("\n");

        documents.push(Document::new(
            content,
            DocumentMetadata::for_path(path)
                .with("format", "csv")
                .with("row", row),
        ));
    }

    tracing::debug!(path = %path.display(), rows = documents.len(), "Loaded CSV");
    Ok(documents)
}
