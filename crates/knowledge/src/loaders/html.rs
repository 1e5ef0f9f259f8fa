//! HTML pages: visible text plus the `<title>`.

use super::normalize_whitespace;
use crate::types::{Document, DocumentMetadata};
use ragbot_core::{AppError, AppResult};
use scraper::{Html, Selector};
use std::path::Path;

const HIDDEN_ELEMENTS: [&str; 4] = ["script", "style", "noscript", "template"];

pub(super) fn load(path: &Path) -> AppResult<Vec<Document>> {
    let bytes = std::fs::read(path)
        .map_err(|e| AppError::Knowledge(format!("Failed to read {}: {}", path.display(), e)))?;
    let html = Html::parse_document(&String::from_utf8_lossy(&bytes));

    let title_selector = Selector::parse("title")
        .map_err(|e| AppError::Knowledge(format!("Invalid selector: {:?}", e)))?;
    let title = html
        .select(&title_selector)
        .next()
        .map(|t| t.text().collect::<String>().trim().to_string())
        .filter(|t| !t.is_empty());

    let content = normalize_whitespace(&visible_text(&html));

    let mut metadata = DocumentMetadata::for_path(path).with("format", "html");
    if let Some(title) = title {
        metadata = metadata.with("title", title);
    }

    Ok(vec![Document::new(content, metadata)])
}

/// Text nodes outside `<head>` and script-like elements, one per line.
fn visible_text(html: &Html) -> String {
    let mut lines = Vec::new();

    for node in html.root_element().descendants() {
        let Some(text) = node.value().as_text() else {
            continue;
        };

        let hidden = node.ancestors().any(|ancestor| {
            ancestor
                .value()
                .as_element()
                .map(|el| el.name() == "head" || HIDDEN_ELEMENTS.contains(&el.name()))
                .unwrap_or(false)
        });
        if hidden {
            continue;
        }

        let trimmed = text.trim();
        if !trimmed.is_empty() {
            lines.push(trimmed.to_string());
        }
    }

    lines.join("\n")
}
