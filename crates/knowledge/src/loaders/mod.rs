//! File loaders, one per supported format.
//!
//! Each loader turns a file into one or more [`Document`]s whose metadata
//! carries the file name as `source`.

mod delimited;
mod docx;
mod html;
mod pdf;
mod spreadsheet;
mod text;

use crate::types::Document;
use ragbot_core::{AppError, AppResult};
use std::path::Path;

/// Extensions accepted by [`DocumentFormat::from_path`], with leading dot.
pub const SUPPORTED_EXTENSIONS: [&str; 9] = [
    ".pdf", ".docx", ".doc", ".html", ".htm", ".csv", ".xlsx", ".xls", ".txt",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Pdf,
    Docx,
    Html,
    Csv,
    Spreadsheet,
    Text,
}

impl DocumentFormat {
    /// Case-insensitive extension lookup; `ext` may carry a leading dot.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.trim_start_matches('.').to_lowercase().as_str() {
            "pdf" => Some(Self::Pdf),
            "docx" | "doc" => Some(Self::Docx),
            "html" | "htm" => Some(Self::Html),
            "csv" => Some(Self::Csv),
            "xlsx" | "xls" => Some(Self::Spreadsheet),
            "txt" => Some(Self::Text),
            _ => None,
        }
    }

    pub fn from_path(path: &Path) -> AppResult<Self> {
        let ext = path
            .extension()
            .map(|e| format!(".{}", e.to_string_lossy().to_lowercase()))
            .unwrap_or_default();

        Self::from_extension(&ext).ok_or_else(|| AppError::UnsupportedFormat {
            extension: if ext.is_empty() { "<none>".to_string() } else { ext },
            supported: SUPPORTED_EXTENSIONS.join(", "),
        })
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Docx => "docx",
            Self::Html => "html",
            Self::Csv => "csv",
            Self::Spreadsheet => "spreadsheet",
            Self::Text => "text",
        }
    }

    /// Load `path` with this format's loader. Blocking.
    pub fn load(&self, path: &Path) -> AppResult<Vec<Document>> {
        match self {
            Self::Pdf => pdf::load(path),
            Self::Docx => docx::load(path),
            Self::Html => html::load(path),
            Self::Csv => delimited::load(path),
            Self::Spreadsheet => spreadsheet::load(path),
            Self::Text => text::load(path),
        }
    }
}

pub fn supported_extensions() -> Vec<String> {
    SUPPORTED_EXTENSIONS.iter().map(|s| s.to_string()).collect()
}

/// Collapse runs of spaces and blank lines left over by format conversion.
pub(crate) fn normalize_whitespace(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut blank_run = 0;

    for line in input.lines() {
        let line = line.split_whitespace().collect::<Vec<_>>().join(" ");
        if line.is_empty() {
            blank_run += 1;
            continue;
        }
        if !out.is_empty() {
            out.push_str(if blank_run > 0 { "\n\n" } else { "\n" });
        }
        out.push_str(&line);
        blank_run = 0;
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extension_mapping() {
        assert_eq!(DocumentFormat::from_extension(".PDF"), Some(DocumentFormat::Pdf));
        assert_eq!(DocumentFormat::from_extension("doc"), Some(DocumentFormat::Docx));
        assert_eq!(DocumentFormat::from_extension(".htm"), Some(DocumentFormat::Html));
        assert_eq!(
            DocumentFormat::from_extension(".xls"),
            Some(DocumentFormat::Spreadsheet)
        );
        assert_eq!(DocumentFormat::from_extension(".md"), None);
    }

    #[test]
    fn test_unsupported_extension_lists_supported_set() {
        let err = DocumentFormat::from_path(Path::new("notes.xyz")).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains(".xyz"));
        for ext in SUPPORTED_EXTENSIONS {
            assert!(msg.contains(ext), "missing {} in {}", ext, msg);
        }
    }

    #[test]
    fn test_normalize_whitespace() {
        let raw = "  Title  \n\n\n  first   line\nsecond line \n";
        assert_eq!(normalize_whitespace(raw), "Title\n\nfirst line\nsecond line");
    }
}
