//! Excel workbooks: one document per non-empty sheet.

use crate::types::{Document, DocumentMetadata};
use calamine::{open_workbook_auto, Reader};
use ragbot_core::{AppError, AppResult};
use std::path::Path;

pub(super) fn load(path: &Path) -> AppResult<Vec<Document>> {
    let mut workbook = open_workbook_auto(path).map_err(|e| {
        AppError::Knowledge(format!("Failed to open workbook {}: {}", path.display(), e))
    })?;

    let mut documents = Vec::new();
    for sheet in workbook.sheet_names() {
        let range = match workbook.worksheet_range(&sheet) {
            Some(Ok(range)) => range,
            Some(Err(e)) => {
                return Err(AppError::Knowledge(format!(
                    "Failed to read sheet '{}': {}",
                    sheet, e
                )))
            }
            None => continue,
        };

        let content = range
            .rows()
            .map(|row| {
                row.iter()
                    .map(|cell| cell.to_string())
                    .collect::<Vec<_>>()
                    .join("\t")
                    .trim_end()
                    .to_string()
            })
            .filter(|line| !line.is_empty())
            .collect::<Vec<_>>()
            .join("\n");

        if content.is_empty() {
            tracing::debug!(sheet = %sheet, "Skipping empty sheet");
            continue;
        }

        documents.push(Document::new(
            content,
            DocumentMetadata::for_path(path)
                .with("format", "spreadsheet")
                .with("sheet", sheet.as_str()),
        ));
    }

    Ok(documents)
}
