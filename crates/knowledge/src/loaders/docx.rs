//! Word documents: paragraphs from `word/document.xml`.

use crate::types::{Document, DocumentMetadata};
use ragbot_core::{AppError, AppResult};
use roxmltree::Document as XmlDocument;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use zip::ZipArchive;

pub(super) fn load(path: &Path) -> AppResult<Vec<Document>> {
    let file = File::open(path)
        .map_err(|e| AppError::Knowledge(format!("Failed to open {}: {}", path.display(), e)))?;

    let mut archive = ZipArchive::new(file).map_err(|e| {
        AppError::Knowledge(format!(
            "{} is not a valid DOCX archive (legacy binary .doc is not readable): {}",
            path.display(),
            e
        ))
    })?;

    let mut document_xml = String::new();
    archive
        .by_name("word/document.xml")
        .map_err(|e| AppError::Knowledge(format!("DOCX missing word/document.xml: {}", e)))?
        .read_to_string(&mut document_xml)
        .map_err(|e| AppError::Knowledge(format!("Failed to read word/document.xml: {}", e)))?;

    let content = paragraphs(&document_xml)?.join("\n\n");

    Ok(vec![Document::new(
        content,
        DocumentMetadata::for_path(path).with("format", "docx"),
    )])
}

fn paragraphs(xml: &str) -> AppResult<Vec<String>> {
    let doc = XmlDocument::parse(xml)
        .map_err(|e| AppError::Knowledge(format!("Failed to parse DOCX XML: {}", e)))?;

    let paragraphs = doc
        .descendants()
        .filter(|node| node.is_element() && node.tag_name().name() == "p")
        .map(|paragraph| {
            paragraph
                .descendants()
                .filter(|node| node.is_element())
                .filter_map(|node| match node.tag_name().name() {
                    "t" => node.text(),
                    "tab" => Some("\t"),
                    "br" => Some("\n"),
                    _ => None,
                })
                .collect::<String>()
        })
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
        .collect();

    Ok(paragraphs)
}
