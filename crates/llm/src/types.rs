//! Provider kinds and typed provider configurations.

use ragbot_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};

pub const OLLAMA_DEFAULT_ENDPOINT: &str = "http://localhost:11434";
pub const OPENAI_DEFAULT_ENDPOINT: &str = "https://api.openai.com/v1";
pub const GROQ_DEFAULT_ENDPOINT: &str = "https://api.groq.com/openai/v1";

/// The closed set of providers ragbot can construct.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    Ollama,
    OpenAi,
    Groq,
}

impl ProviderKind {
    /// Parse provider kind from its configured name.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "ollama" => Some(Self::Ollama),
            "openai" | "open-ai" | "open_ai" => Some(Self::OpenAi),
            "groq" => Some(Self::Groq),
            _ => None,
        }
    }

    /// Map a chat-model class name from older registry files to a kind.
    pub fn from_class_name(class: &str) -> Option<Self> {
        match class.trim() {
            "ChatOllama" | "Ollama" | "OllamaLLM" => Some(Self::Ollama),
            "ChatOpenAI" | "OpenAI" => Some(Self::OpenAi),
            "ChatGroq" => Some(Self::Groq),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ollama => "ollama",
            Self::OpenAi => "openai",
            Self::Groq => "groq",
        }
    }

    pub fn default_endpoint(&self) -> &'static str {
        match self {
            Self::Ollama => OLLAMA_DEFAULT_ENDPOINT,
            Self::OpenAi => OPENAI_DEFAULT_ENDPOINT,
            Self::Groq => GROQ_DEFAULT_ENDPOINT,
        }
    }
}

/// Ollama configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OllamaConfig {
    #[serde(alias = "model_name")]
    pub model: String,

    #[serde(default, alias = "base_url")]
    pub endpoint: Option<String>,

    #[serde(default)]
    pub temperature: Option<f32>,

    #[serde(default, alias = "num_predict")]
    pub max_tokens: Option<u32>,

    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

/// Configuration for OpenAI-compatible chat completion APIs (OpenAI, Groq).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OpenAiConfig {
    #[serde(alias = "model_name")]
    pub model: String,

    #[serde(alias = "groq_api_key", alias = "openai_api_key")]
    pub api_key: String,

    #[serde(default, alias = "base_url", alias = "api_base")]
    pub endpoint: Option<String>,

    #[serde(default)]
    pub temperature: Option<f32>,

    #[serde(default)]
    pub max_tokens: Option<u32>,

    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

/// A resolved, typed provider configuration.
#[derive(Debug, Clone, PartialEq)]
pub enum ProviderConfig {
    Ollama(OllamaConfig),
    OpenAi(OpenAiConfig),
    Groq(OpenAiConfig),
}

impl ProviderConfig {
    /// Build a typed configuration from an already env-resolved JSON object.
    pub fn from_value(kind: ProviderKind, value: serde_json::Value) -> AppResult<Self> {
        let value = if value.is_null() {
            serde_json::Value::Object(Default::default())
        } else {
            value
        };

        let invalid = |e: serde_json::Error| {
            AppError::Config(format!("Invalid {} configuration: {}", kind.as_str(), e))
        };

        match kind {
            ProviderKind::Ollama => serde_json::from_value(value)
                .map(ProviderConfig::Ollama)
                .map_err(invalid),
            ProviderKind::OpenAi => serde_json::from_value(value)
                .map(ProviderConfig::OpenAi)
                .map_err(invalid),
            ProviderKind::Groq => serde_json::from_value(value)
                .map(ProviderConfig::Groq)
                .map_err(invalid),
        }
    }

    pub fn kind(&self) -> ProviderKind {
        match self {
            Self::Ollama(_) => ProviderKind::Ollama,
            Self::OpenAi(_) => ProviderKind::OpenAi,
            Self::Groq(_) => ProviderKind::Groq,
        }
    }

    pub fn model(&self) -> &str {
        match self {
            Self::Ollama(cfg) => &cfg.model,
            Self::OpenAi(cfg) | Self::Groq(cfg) => &cfg.model,
        }
    }
}
