//! Error types for ragbot.
//!
//! A single enum covers configuration, document loading, vector store,
//! LLM and prompt failures. Front-ends turn any variant into a user-visible
//! message; the core never panics on user input.

use std::path::PathBuf;

use thiserror::Error;

/// Unified error type for ragbot.
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// An `ENV:<VAR>` reference named a variable that is not set
    #[error("Configuration error: Environment variable {0} not found")]
    MissingEnvVar(String),

    /// A registry entry names a provider that has no client implementation
    #[error("Configuration error: Unknown LLM provider: {0}")]
    UnresolvedProvider(String),

    /// File extension has no registered loader
    #[error("Unsupported file type: {extension}. Supported types: {supported}")]
    UnsupportedFormat { extension: String, supported: String },

    /// Input path does not exist
    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),

    /// I/O and filesystem errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// LLM provider errors
    #[error("LLM error: {0}")]
    Llm(String),

    /// Embedding provider errors
    #[error("Embedding error: {0}")]
    Embedding(String),

    /// Document processing and vector store errors
    #[error("Knowledge error: {0}")]
    Knowledge(String),

    /// Prompt template errors
    #[error("Prompt error: {0}")]
    Prompt(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic errors
    #[error("{0}")]
    Other(String),
}

impl AppError {
    /// True for errors caused by configuration rather than runtime failures.
    pub fn is_config(&self) -> bool {
        matches!(
            self,
            AppError::Config(_) | AppError::MissingEnvVar(_) | AppError::UnresolvedProvider(_)
        )
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for AppError {
    fn from(err: serde_yaml::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

/// Convenience type alias for Results with AppError.
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsupported_format_lists_supported_types() {
        let err = AppError::UnsupportedFormat {
            extension: ".xyz".to_string(),
            supported: ".pdf, .txt".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Unsupported file type: .xyz. Supported types: .pdf, .txt"
        );
    }

    #[test]
    fn test_missing_env_var_is_config_error() {
        let err = AppError::MissingEnvVar("GROQ_API_KEY".to_string());
        assert!(err.is_config());
        assert!(err.to_string().contains("GROQ_API_KEY"));
        assert!(!AppError::Llm("boom".into()).is_config());
    }
}
