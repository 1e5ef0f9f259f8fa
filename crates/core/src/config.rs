//! Configuration management for ragbot.
//!
//! Sources, lowest precedence first:
//! - Built-in defaults
//! - YAML config file (`ragbot.yaml` or `RAGBOT_CONFIG`)
//! - Environment variables (a `.env` file is loaded first when present)
//! - Command-line flags via [`AppConfig::with_overrides`]

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{AppError, AppResult};

pub const DEFAULT_CONFIG_FILE: &str = "ragbot.yaml";
pub const DEFAULT_LLM_CONFIG: &str = "config/llm.json";
pub const DEFAULT_COLLECTION: &str = "rag_documents";

/// Main application configuration shared by the CLI and the HTTP API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Optional YAML config file path
    pub config_file: Option<PathBuf>,

    /// Path to the LLM registry (JSON)
    pub llm_config_path: PathBuf,

    /// Maximum characters per chunk
    pub chunk_size: usize,

    /// Characters shared between consecutive chunks
    pub chunk_overlap: usize,

    /// Directory holding the vector database
    pub persist_directory: PathBuf,

    /// Vector store collection (table) name
    pub collection_name: String,

    /// Directory where uploaded files are stored
    pub upload_dir: PathBuf,

    pub embedding: EmbeddingSettings,

    /// Token budget for conversation memory
    pub memory_max_tokens: usize,

    /// Number of chunks retrieved per question
    pub retrieval_k: usize,

    /// Optional YAML file overriding the QA prompt
    pub prompt_file: Option<PathBuf>,

    /// HTTP bind address
    pub bind_addr: String,

    /// Log level override
    pub log_level: Option<String>,

    /// Verbose mode (enables debug logging)
    pub verbose: bool,

    /// Disable colored output
    pub no_color: bool,
}

/// Embedding backend selection.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EmbeddingSettings {
    /// `ollama` or `hashed`
    pub provider: String,
    pub model: String,
    pub dimensions: usize,
    pub endpoint: String,
    pub batch_size: usize,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            provider: "ollama".to_string(),
            model: "all-minilm".to_string(),
            dimensions: 384,
            endpoint: "http://localhost:11434".to_string(),
            batch_size: 32,
        }
    }
}

/// Full configuration file structure.
#[derive(Debug, Clone, Default, Deserialize)]
struct ConfigFile {
    llm_config: Option<PathBuf>,
    documents: Option<DocumentsSection>,
    vector_store: Option<VectorStoreSection>,
    embedding: Option<EmbeddingSection>,
    chat: Option<ChatSection>,
    server: Option<ServerSection>,
    logging: Option<LoggingSection>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct DocumentsSection {
    chunk_size: Option<usize>,
    chunk_overlap: Option<usize>,
    upload_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct VectorStoreSection {
    persist_directory: Option<PathBuf>,
    collection: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct EmbeddingSection {
    provider: Option<String>,
    model: Option<String>,
    dimensions: Option<usize>,
    endpoint: Option<String>,
    batch_size: Option<usize>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct ChatSection {
    memory_max_tokens: Option<usize>,
    retrieval_k: Option<usize>,
    prompt_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct ServerSection {
    bind: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct LoggingSection {
    level: Option<String>,
    color: Option<bool>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            config_file: None,
            llm_config_path: PathBuf::from(DEFAULT_LLM_CONFIG),
            chunk_size: 1000,
            chunk_overlap: 200,
            persist_directory: PathBuf::from("./vector_db"),
            collection_name: DEFAULT_COLLECTION.to_string(),
            upload_dir: PathBuf::from("uploads"),
            embedding: EmbeddingSettings::default(),
            memory_max_tokens: 3000,
            retrieval_k: 4,
            prompt_file: None,
            bind_addr: "0.0.0.0:8000".to_string(),
            log_level: None,
            verbose: false,
            no_color: false,
        }
    }
}

impl AppConfig {
    /// Load configuration from `.env`, the YAML file, and the environment.
    ///
    /// # Example
    /// ```no_run
    /// use ragbot_core::config::AppConfig;
    ///
    /// let config = AppConfig::load(None).expect("Failed to load config");
    /// println!("Vector store: {:?}", config.persist_directory);
    /// ```
    pub fn load(config_file: Option<PathBuf>) -> AppResult<Self> {
        // A missing .env is normal
        let _ = dotenv::dotenv();

        let mut config = Self::default();

        config.config_file = config_file.or_else(|| std::env::var("RAGBOT_CONFIG").ok().map(PathBuf::from));

        let config_path = config
            .config_file
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));

        if config_path.exists() {
            config = config.merge_yaml(&config_path)?;
        } else if config.config_file.is_some() {
            return Err(AppError::Config(format!(
                "Config file does not exist: {:?}",
                config_path
            )));
        }

        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;

        Ok(config)
    }

    /// Merge YAML configuration file into this config.
    fn merge_yaml(&self, path: &Path) -> AppResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        let file: ConfigFile = serde_yaml::from_str(&contents).map_err(|e| {
            AppError::Config(format!("Failed to parse config file {:?}: {}", path, e))
        })?;

        let mut result = self.clone();

        if let Some(path) = file.llm_config {
            result.llm_config_path = path;
        }

        if let Some(docs) = file.documents {
            if let Some(size) = docs.chunk_size {
                result.chunk_size = size;
            }
            if let Some(overlap) = docs.chunk_overlap {
                result.chunk_overlap = overlap;
            }
            if let Some(dir) = docs.upload_dir {
                result.upload_dir = dir;
            }
        }

        if let Some(store) = file.vector_store {
            if let Some(dir) = store.persist_directory {
                result.persist_directory = dir;
            }
            if let Some(collection) = store.collection {
                result.collection_name = collection;
            }
        }

        if let Some(emb) = file.embedding {
            if let Some(provider) = emb.provider {
                result.embedding.provider = provider;
            }
            if let Some(model) = emb.model {
                result.embedding.model = model;
            }
            if let Some(dimensions) = emb.dimensions {
                result.embedding.dimensions = dimensions;
            }
            if let Some(endpoint) = emb.endpoint {
                result.embedding.endpoint = endpoint;
            }
            if let Some(batch_size) = emb.batch_size {
                result.embedding.batch_size = batch_size;
            }
        }

        if let Some(chat) = file.chat {
            if let Some(tokens) = chat.memory_max_tokens {
                result.memory_max_tokens = tokens;
            }
            if let Some(k) = chat.retrieval_k {
                result.retrieval_k = k;
            }
            if chat.prompt_file.is_some() {
                result.prompt_file = chat.prompt_file;
            }
        }

        if let Some(bind) = file.server.and_then(|s| s.bind) {
            result.bind_addr = bind;
        }

        if let Some(logging) = file.logging {
            if let Some(level) = logging.level {
                result.log_level = Some(level);
            }
            if let Some(color) = logging.color {
                result.no_color = !color;
            }
        }

        Ok(result)
    }

    /// Apply environment variables through `lookup`.
    ///
    /// Numeric variables that fail to parse are configuration errors.
    pub fn apply_env<F>(&mut self, lookup: F) -> AppResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = lookup("RAGBOT_LLM_CONFIG") {
            self.llm_config_path = PathBuf::from(path);
        }
        if let Some(size) = parse_env(&lookup, "CHUNK_SIZE")? {
            self.chunk_size = size;
        }
        if let Some(overlap) = parse_env(&lookup, "CHUNK_OVERLAP")? {
            self.chunk_overlap = overlap;
        }
        if let Some(dir) = lookup("VECTOR_STORE_DIR").or_else(|| lookup("CHROMA_PERSIST_DIRECTORY")) {
            self.persist_directory = PathBuf::from(dir);
        }
        if let Some(collection) = lookup("RAGBOT_COLLECTION") {
            self.collection_name = collection;
        }
        if let Some(dir) = lookup("UPLOAD_DIR") {
            self.upload_dir = PathBuf::from(dir);
        }
        if let Some(provider) = lookup("EMBEDDING_PROVIDER") {
            self.embedding.provider = provider;
        }
        if let Some(model) = lookup("EMBEDDING_MODEL") {
            self.embedding.model = model;
        }
        if let Some(dimensions) = parse_env(&lookup, "EMBEDDING_DIMENSIONS")? {
            self.embedding.dimensions = dimensions;
        }
        if let Some(url) = lookup("OLLAMA_URL") {
            self.embedding.endpoint = url;
        }
        if let Some(tokens) = parse_env(&lookup, "MEMORY_MAX_TOKENS")? {
            self.memory_max_tokens = tokens;
        }
        if let Some(k) = parse_env(&lookup, "RETRIEVAL_K")? {
            self.retrieval_k = k;
        }
        if let Some(bind) = lookup("RAGBOT_BIND") {
            self.bind_addr = bind;
        }
        if let Some(prompt) = lookup("RAGBOT_PROMPT_FILE") {
            self.prompt_file = Some(PathBuf::from(prompt));
        }
        if let Some(level) = lookup("RUST_LOG") {
            self.log_level = Some(level);
        }
        if lookup("NO_COLOR").is_some() {
            self.no_color = true;
        }
        Ok(())
    }

    /// Apply CLI overrides to the configuration.
    ///
    /// CLI flags take precedence over environment variables.
    pub fn with_overrides(
        mut self,
        llm_config: Option<PathBuf>,
        log_level: Option<String>,
        verbose: bool,
        no_color: bool,
    ) -> Self {
        if let Some(path) = llm_config {
            self.llm_config_path = path;
        }

        if verbose {
            self.verbose = true;
            // Replaces a level from the file or RUST_LOG; --log-level still wins
            self.log_level = Some("debug".to_string());
        }

        if let Some(log_level) = log_level {
            self.log_level = Some(log_level);
        }

        if no_color {
            self.no_color = true;
        }

        self
    }

    /// Validate chunking, retrieval and embedding settings.
    pub fn validate(&self) -> AppResult<()> {
        if self.chunk_size == 0 {
            return Err(AppError::Config("chunk_size must be greater than 0".to_string()));
        }
        if self.chunk_overlap >= self.chunk_size {
            return Err(AppError::Config(format!(
                "chunk_overlap ({}) must be smaller than chunk_size ({})",
                self.chunk_overlap, self.chunk_size
            )));
        }
        if self.retrieval_k == 0 {
            return Err(AppError::Config("retrieval_k must be at least 1".to_string()));
        }
        if self.embedding.dimensions == 0 || self.embedding.batch_size == 0 {
            return Err(AppError::Config(
                "embedding dimensions and batch_size must be greater than 0".to_string(),
            ));
        }

        let known_providers = ["ollama", "hashed"];
        if !known_providers.contains(&self.embedding.provider.as_str()) {
            return Err(AppError::Config(format!(
                "Unknown embedding provider: {}. Supported: {}",
                self.embedding.provider,
                known_providers.join(", ")
            )));
        }

        Ok(())
    }

    /// Ensure the upload directory exists.
    pub fn ensure_upload_dir(&self) -> AppResult<()> {
        if !self.upload_dir.exists() {
            std::fs::create_dir_all(&self.upload_dir).map_err(|e| {
                AppError::Config(format!(
                    "Failed to create upload directory {:?}: {}",
                    self.upload_dir, e
                ))
            })?;
            tracing::info!("Created upload directory: {:?}", self.upload_dir);
        }
        Ok(())
    }
}

fn parse_env<F>(lookup: &F, key: &str) -> AppResult<Option<usize>>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<usize>()
            .map(Some)
            .map_err(|e| AppError::Config(format!("Invalid value for {}: {:?} ({})", key, raw, e))),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.chunk_size, 1000);
        assert_eq!(config.chunk_overlap, 200);
        assert_eq!(config.collection_name, "rag_documents");
        assert_eq!(config.memory_max_tokens, 3000);
        assert_eq!(config.retrieval_k, 4);
        assert_eq!(config.embedding.dimensions, 384);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_env_overrides_defaults() {
        let mut config = AppConfig::default();
        config
            .apply_env(lookup_from(&[
                ("CHUNK_SIZE", "500"),
                ("CHUNK_OVERLAP", "50"),
                ("CHROMA_PERSIST_DIRECTORY", "/tmp/store"),
                ("EMBEDDING_PROVIDER", "hashed"),
            ]))
            .unwrap();

        assert_eq!(config.chunk_size, 500);
        assert_eq!(config.chunk_overlap, 50);
        assert_eq!(config.persist_directory, PathBuf::from("/tmp/store"));
        assert_eq!(config.embedding.provider, "hashed");
    }

    #[test]
    fn test_vector_store_dir_wins_over_legacy_name() {
        let mut config = AppConfig::default();
        config
            .apply_env(lookup_from(&[
                ("VECTOR_STORE_DIR", "/data/new"),
                ("CHROMA_PERSIST_DIRECTORY", "/data/old"),
            ]))
            .unwrap();
        assert_eq!(config.persist_directory, PathBuf::from("/data/new"));
    }

    #[test]
    fn test_invalid_numeric_env_is_config_error() {
        let mut config = AppConfig::default();
        let err = config
            .apply_env(lookup_from(&[("CHUNK_SIZE", "lots")]))
            .unwrap_err();
        assert!(err.is_config());
        assert!(err.to_string().contains("CHUNK_SIZE"));
    }

    #[test]
    fn test_merge_yaml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ragbot.yaml");
        std::fs::write(
            &path,
            "documents:\n  chunk_size: 800\nvector_store:\n  collection: manuals\nembedding:\n  provider: hashed\n  dimensions: 64\nlogging:\n  color: false\n",
        )
        .unwrap();

        let config = AppConfig::default().merge_yaml(&path).unwrap();
        assert_eq!(config.chunk_size, 800);
        assert_eq!(config.chunk_overlap, 200);
        assert_eq!(config.collection_name, "manuals");
        assert_eq!(config.embedding.provider, "hashed");
        assert_eq!(config.embedding.dimensions, 64);
        assert!(config.no_color);
    }

    #[test]
    fn test_with_overrides() {
        let config = AppConfig::default().with_overrides(
            Some(PathBuf::from("other/llm.json")),
            None,
            true,
            false,
        );

        assert_eq!(config.llm_config_path, PathBuf::from("other/llm.json"));
        assert!(config.verbose);
        assert_eq!(config.log_level, Some("debug".to_string()));
    }

    #[test]
    fn test_verbose_overrides_environment_level() {
        let mut config = AppConfig::default();
        config
            .apply_env(|key| (key == "RUST_LOG").then(|| "warn".to_string()))
            .unwrap();
        assert_eq!(config.log_level, Some("warn".to_string()));

        let config = config.with_overrides(None, None, true, false);
        assert_eq!(config.log_level, Some("debug".to_string()));
    }

    #[test]
    fn test_explicit_log_level_beats_verbose() {
        let config = AppConfig::default().with_overrides(None, Some("trace".to_string()), true, false);
        assert_eq!(config.log_level, Some("trace".to_string()));
        assert!(config.verbose);
    }

    #[test]
    fn test_validate_rejects_overlap_not_smaller_than_size() {
        let config = AppConfig {
            chunk_size: 100,
            chunk_overlap: 100,
            ..AppConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_unknown_embedding_provider() {
        let mut config = AppConfig::default();
        config.embedding.provider = "word2vec".to_string();
        assert!(config.validate().is_err());
    }
}
