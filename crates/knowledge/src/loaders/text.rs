//! Plain text files.

use crate::types::{Document, DocumentMetadata};
use ragbot_core::{AppError, AppResult};
use std::path::Path;

pub(super) fn load(path: &Path) -> AppResult<Vec<Document>> {
    let bytes = std::fs::read(path)
        .map_err(|e| AppError::Knowledge(format!("Failed to read {}: {}", path.display(), e)))?;

    // Non-UTF-8 bytes are replaced rather than rejected
    let content = String::from_utf8_lossy(&bytes).into_owned();

    Ok(vec![Document::new(
        content,
        DocumentMetadata::for_path(path).with("format", "text"),
    )])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_text() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hello.txt");
        std::fs::write(&path, "hello world").unwrap();

        let docs = load(&path).unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].content, "hello world");
        assert_eq!(docs[0].metadata.source, "hello.txt");
    }

    #[test]
    fn test_invalid_utf8_is_replaced() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("latin1.txt");
        std::fs::write(&path, [b'c', b'a', b'f', 0xE9]).unwrap();

        let docs = load(&path).unwrap();
        assert!(docs[0].content.starts_with("caf"));
    }
}
