//! Embedding configuration and the per-collection record of it.

use ragbot_core::{AppError, AppResult, EmbeddingSettings};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Embedding configuration for a collection.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EmbeddingConfig {
    /// Provider name: "ollama" or "hashed"
    pub provider: String,

    /// Model identifier (provider-specific)
    pub model: String,

    /// Embedding vector dimensions
    pub dimensions: usize,

    /// Base URL for network providers
    #[serde(default)]
    pub endpoint: String,

    /// Maximum texts per embedding call
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
}

fn default_batch_size() -> usize {
    32
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self::from(&EmbeddingSettings::default())
    }
}

impl From<&EmbeddingSettings> for EmbeddingConfig {
    fn from(settings: &EmbeddingSettings) -> Self {
        Self {
            provider: settings.provider.clone(),
            model: settings.model.clone(),
            dimensions: settings.dimensions,
            endpoint: settings.endpoint.clone(),
            batch_size: settings.batch_size,
        }
    }
}

impl EmbeddingConfig {
    /// Read a config previously written by [`EmbeddingConfig::save`].
    /// Returns `None` when the file does not exist.
    pub fn load(path: &Path) -> AppResult<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(path).map_err(|e| {
            AppError::Knowledge(format!("Failed to read embedding config at {:?}: {}", path, e))
        })?;

        let config = serde_json::from_str(&content).map_err(|e| {
            AppError::Knowledge(format!("Failed to parse embedding config at {:?}: {}", path, e))
        })?;

        Ok(Some(config))
    }

    pub fn save(&self, path: &Path) -> AppResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                AppError::Knowledge(format!("Failed to create directory {:?}: {}", parent, e))
            })?;
        }

        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json).map_err(|e| {
            AppError::Knowledge(format!("Failed to write embedding config to {:?}: {}", path, e))
        })?;

        tracing::debug!(path = %path.display(), "Saved embedding config");
        Ok(())
    }

    /// Validate that another config is consistent with this one.
    ///
    /// Vectors from different models or dimensions cannot share a table,
    /// so the endpoint and batch size are not compared.
    pub fn validate_consistency(&self, other: &Self) -> AppResult<()> {
        if self.provider != other.provider {
            return Err(AppError::Knowledge(format!(
                "Provider mismatch: expected '{}', got '{}'",
                self.provider, other.provider
            )));
        }

        if self.model != other.model {
            return Err(AppError::Knowledge(format!(
                "Model mismatch: expected '{}', got '{}'",
                self.model, other.model
            )));
        }

        if self.dimensions != other.dimensions {
            return Err(AppError::Knowledge(format!(
                "Dimension mismatch: expected {}, got {}",
                self.dimensions, other.dimensions
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_follows_settings() {
        let config = EmbeddingConfig::default();
        assert_eq!(config.provider, "ollama");
        assert_eq!(config.model, "all-minilm");
        assert_eq!(config.dimensions, 384);
        assert_eq!(config.batch_size, 32);
    }

    #[test]
    fn test_save_and_load() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("docs.embedding.json");
        let config = EmbeddingConfig {
            provider: "hashed".to_string(),
            model: "hashed-trigram".to_string(),
            dimensions: 256,
            endpoint: String::new(),
            batch_size: 64,
        };

        config.save(&path).unwrap();
        assert_eq!(EmbeddingConfig::load(&path).unwrap(), Some(config));
    }

    #[test]
    fn test_load_missing_is_none() {
        let temp = TempDir::new().unwrap();
        assert!(EmbeddingConfig::load(&temp.path().join("nope.json"))
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_validate_consistency_ignores_endpoint() {
        let a = EmbeddingConfig::default();
        let b = EmbeddingConfig {
            endpoint: "http://gpu-box:11434".to_string(),
            batch_size: 8,
            ..a.clone()
        };
        assert!(a.validate_consistency(&b).is_ok());
    }

    #[test]
    fn test_validate_consistency_model_mismatch() {
        let a = EmbeddingConfig::default();
        let b = EmbeddingConfig {
            model: "nomic-embed-text".to_string(),
            ..a.clone()
        };

        let err = a.validate_consistency(&b).unwrap_err();
        assert!(err.to_string().contains("Model mismatch"));
    }

    #[test]
    fn test_validate_consistency_dimension_mismatch() {
        let a = EmbeddingConfig::default();
        let b = EmbeddingConfig {
            dimensions: 768,
            ..a.clone()
        };

        let err = a.validate_consistency(&b).unwrap_err();
        assert!(err.to_string().contains("Dimension mismatch"));
    }
}
