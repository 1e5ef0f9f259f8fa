//! PDF text extraction.

use super::normalize_whitespace;
use crate::types::{Document, DocumentMetadata};
use ragbot_core::{AppError, AppResult};
use std::path::Path;

pub(super) fn load(path: &Path) -> AppResult<Vec<Document>> {
    let raw = pdf_extract::extract_text(path).map_err(|e| {
        AppError::Knowledge(format!("Failed to extract PDF text from {}: {}", path.display(), e))
    })?;

    let content = normalize_whitespace(&raw);
    if content.is_empty() {
        tracing::warn!(path = %path.display(), "PDF contains no extractable text");
    }

    Ok(vec![Document::new(
        content,
        DocumentMetadata::for_path(path).with("format", "pdf"),
    )])
}
