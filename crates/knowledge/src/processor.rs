//! Turning files into chunks: format detection, loading, splitting.

use crate::loaders::{supported_extensions, DocumentFormat};
use crate::splitter::DocumentSplitter;
use crate::types::{BatchOutcome, Chunk, Document};
use ragbot_core::{AppConfig, AppError, AppResult};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Loads supported files and splits them into overlapping chunks.
///
/// All methods block on file IO and parsing; async callers should run
/// them on the blocking pool.
pub struct DocumentProcessor {
    splitter: DocumentSplitter,
}

impl DocumentProcessor {
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> AppResult<Self> {
        Ok(Self {
            splitter: DocumentSplitter::new(chunk_size, chunk_overlap)?,
        })
    }

    pub fn from_config(config: &AppConfig) -> AppResult<Self> {
        Self::new(config.chunk_size, config.chunk_overlap)
    }

    pub fn chunk_size(&self) -> usize {
        self.splitter.chunk_size()
    }

    pub fn chunk_overlap(&self) -> usize {
        self.splitter.chunk_overlap()
    }

    pub fn supported_extensions(&self) -> Vec<String> {
        supported_extensions()
    }

    pub fn is_supported(path: &Path) -> bool {
        DocumentFormat::from_path(path).is_ok()
    }

    /// Load a file into documents without splitting.
    pub fn load_document(&self, path: &Path) -> AppResult<Vec<Document>> {
        if !path.exists() {
            return Err(AppError::FileNotFound(path.to_path_buf()));
        }

        let format = DocumentFormat::from_path(path)?;
        tracing::debug!(path = %path.display(), format = format.as_str(), "Loading document");

        format.load(path).map_err(|e| {
            AppError::Knowledge(format!("Error loading document {}: {}", path.display(), e))
        })
    }

    pub fn split_documents(&self, documents: &[Document]) -> Vec<Chunk> {
        self.splitter.split(documents)
    }

    /// Load and split one file.
    pub fn process_document(&self, path: &Path) -> AppResult<Vec<Chunk>> {
        let documents = self.load_document(path)?;
        let chunks = self.split_documents(&documents);

        tracing::info!(
            path = %path.display(),
            documents = documents.len(),
            chunks = chunks.len(),
            "Processed document"
        );

        Ok(chunks)
    }

    /// Process each path independently; one failing file does not stop the rest.
    pub fn process_documents(&self, paths: &[PathBuf]) -> BatchOutcome {
        let mut outcome = BatchOutcome::default();

        for path in paths {
            match self.process_document(path) {
                Ok(chunks) => {
                    outcome
                        .processed
                        .push((path.display().to_string(), chunks.len()));
                    outcome.chunks.extend(chunks);
                }
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Failed to process document");
                    outcome.failed.push((path.display().to_string(), e.to_string()));
                }
            }
        }

        tracing::info!(
            processed = outcome.processed.len(),
            failed = outcome.failed.len(),
            chunks = outcome.chunks.len(),
            "Processed batch"
        );

        outcome
    }

    /// Process every supported file in `dir`; subdirectories only when `recursive`.
    pub fn process_directory(&self, dir: &Path, recursive: bool) -> AppResult<BatchOutcome> {
        let paths = Self::discover(dir, recursive)?;
        tracing::info!(dir = %dir.display(), files = paths.len(), recursive, "Discovered documents");
        Ok(self.process_documents(&paths))
    }

    /// Supported files under `dir`, sorted by path.
    pub fn discover(dir: &Path, recursive: bool) -> AppResult<Vec<PathBuf>> {
        if !dir.is_dir() {
            return Err(AppError::Knowledge(format!(
                "Not a directory: {}",
                dir.display()
            )));
        }

        let walker = WalkDir::new(dir)
            .max_depth(if recursive { usize::MAX } else { 1 })
            .sort_by_file_name();

        let mut paths = Vec::new();
        for entry in walker {
            let entry = entry.map_err(|e| {
                AppError::Knowledge(format!("Failed to read directory {}: {}", dir.display(), e))
            })?;
            if entry.file_type().is_file() && Self::is_supported(entry.path()) {
                paths.push(entry.into_path());
            }
        }

        Ok(paths)
    }
}
