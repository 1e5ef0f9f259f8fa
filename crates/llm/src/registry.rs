//! LLM registry file.
//!
//! The registry is a JSON document naming every available model and
//! designating one as the manager:
//!
//! ```json
//! {
//!   "managerLLM": "groq",
//!   "llms": {
//!     "groq": {
//!       "provider": "groq",
//!       "load_on_init": "True",
//!       "config": { "model": "llama-3.3-70b-versatile", "api_key": "ENV:GROQ_API_KEY" }
//!     }
//!   }
//! }
//! ```
//!
//! String values of the form `ENV:<VAR>` are replaced by the variable's
//! value at any depth of `config`.

use crate::types::{ProviderConfig, ProviderKind};
use ragbot_core::{AppError, AppResult};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;

const ENV_PREFIX: &str = "ENV:";

/// Parsed registry file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LlmRegistry {
    /// Name of the entry used to answer questions
    #[serde(rename = "managerLLM", alias = "manager_llm", default)]
    pub manager_llm: Option<String>,

    #[serde(default)]
    pub llms: BTreeMap<String, RegistryEntry>,
}

/// One named model in the registry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryEntry {
    /// Provider name (`ollama`, `openai`, `groq`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,

    /// Module path from older registry files; informational only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub import_module: Option<String>,

    /// Chat-model class name, used to infer the provider when `provider` is absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub import_class: Option<String>,

    /// Provider settings, possibly containing `ENV:` references
    #[serde(default)]
    pub config: Value,

    #[serde(default, deserialize_with = "deserialize_flag")]
    pub load_on_init: bool,
}

impl RegistryEntry {
    /// Resolve the provider kind from `provider`, falling back to `import_class`.
    pub fn kind(&self) -> AppResult<ProviderKind> {
        if let Some(provider) = &self.provider {
            return ProviderKind::parse(provider)
                .ok_or_else(|| AppError::UnresolvedProvider(provider.clone()));
        }

        match &self.import_class {
            Some(class) => ProviderKind::from_class_name(class).ok_or_else(|| {
                let module = self.import_module.as_deref().unwrap_or("?");
                AppError::UnresolvedProvider(format!("{}.{}", module, class))
            }),
            None => Err(AppError::UnresolvedProvider(
                "entry has neither provider nor import_class".to_string(),
            )),
        }
    }

    /// Resolve `ENV:` references and build the typed provider configuration.
    pub fn provider_config(&self) -> AppResult<ProviderConfig> {
        self.provider_config_with(|key| std::env::var(key).ok())
    }

    pub fn provider_config_with<F>(&self, lookup: F) -> AppResult<ProviderConfig>
    where
        F: Fn(&str) -> Option<String>,
    {
        let kind = self.kind()?;
        let resolved = resolve_env_values(&self.config, &lookup)?;
        ProviderConfig::from_value(kind, resolved)
    }
}

impl LlmRegistry {
    /// Load the registry from a JSON file.
    pub fn from_file(path: &Path) -> AppResult<Self> {
        if !path.exists() {
            return Err(AppError::Config(format!(
                "LLM config file not found: {}",
                path.display()
            )));
        }

        let contents = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("Failed to read LLM config {}: {}", path.display(), e))
        })?;

        Self::from_json_str(&contents).map_err(|e| match e {
            AppError::Serialization(msg) => AppError::Config(format!(
                "Failed to parse LLM config {}: {}",
                path.display(),
                msg
            )),
            other => other,
        })
    }

    pub fn from_json_str(json: &str) -> AppResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn entry(&self, name: &str) -> AppResult<&RegistryEntry> {
        self.llms
            .get(name)
            .ok_or_else(|| AppError::Config(format!("LLM '{}' not found in configuration", name)))
    }

    /// Registered names in sorted order.
    pub fn names(&self) -> Vec<String> {
        self.llms.keys().cloned().collect()
    }
}

/// Replace every `ENV:<VAR>` string in `value` with the variable's value.
///
/// Recurses through objects and arrays. Fails on the first unset variable.
pub fn resolve_env_values<F>(value: &Value, lookup: &F) -> AppResult<Value>
where
    F: Fn(&str) -> Option<String>,
{
    match value {
        Value::String(s) => match s.strip_prefix(ENV_PREFIX) {
            Some(var) => {
                let var = var.trim();
                lookup(var)
                    .map(Value::String)
                    .ok_or_else(|| AppError::MissingEnvVar(var.to_string()))
            }
            None => Ok(value.clone()),
        },
        Value::Object(map) => {
            let mut resolved = serde_json::Map::with_capacity(map.len());
            for (key, inner) in map {
                resolved.insert(key.clone(), resolve_env_values(inner, lookup)?);
            }
            Ok(Value::Object(resolved))
        }
        Value::Array(items) => items
            .iter()
            .map(|item| resolve_env_values(item, lookup))
            .collect::<AppResult<Vec<_>>>()
            .map(Value::Array),
        _ => Ok(value.clone()),
    }
}

/// Accept `true`/`false` as well as the strings `"True"`/`"False"`.
fn deserialize_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Text(String),
    }

    Ok(match Flag::deserialize(deserializer)? {
        Flag::Bool(b) => b,
        Flag::Text(s) => matches!(s.trim().to_lowercase().as_str(), "true" | "yes" | "1"),
    })
}
