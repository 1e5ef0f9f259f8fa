//! LLM loader: lazily constructs registry entries and caches them by name.

use crate::client::{LlmClient, LlmSource};
use crate::factory::create_client;
use crate::registry::{LlmRegistry, RegistryEntry};
use ragbot_core::{AppError, AppResult};
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};

/// Hands out LLM clients by registry name.
///
/// Each name is constructed at most once; construction happens while the
/// cache lock is held so concurrent first requests cannot build twice.
pub struct LlmLoader {
    registry: LlmRegistry,
    cache: Mutex<HashMap<String, Arc<dyn LlmClient>>>,
}

impl LlmLoader {
    /// Read the registry and eagerly construct `load_on_init` entries.
    ///
    /// Eager failures are logged and skipped; the entry can still be
    /// requested later and will report its error then.
    pub fn from_file(path: &Path) -> AppResult<Self> {
        let registry = LlmRegistry::from_file(path)?;
        tracing::info!(
            path = %path.display(),
            count = registry.llms.len(),
            manager = registry.manager_llm.as_deref().unwrap_or("<none>"),
            "Loaded LLM registry"
        );
        Ok(Self::new(registry))
    }

    pub fn new(registry: LlmRegistry) -> Self {
        let loader = Self {
            registry,
            cache: Mutex::new(HashMap::new()),
        };
        loader.load_eager();
        loader
    }

    fn load_eager(&self) {
        let eager: Vec<String> = self
            .registry
            .llms
            .iter()
            .filter(|(_, entry)| entry.load_on_init)
            .map(|(name, _)| name.clone())
            .collect();

        for name in eager {
            match self.load_llm(&name) {
                Ok(client) => tracing::info!(
                    name = %name,
                    provider = client.provider_name(),
                    model = client.model_name(),
                    "Loaded LLM on init"
                ),
                Err(e) => tracing::warn!(name = %name, error = %e, "Failed to load LLM on init"),
            }
        }
    }

    /// Return the cached client for `name`, constructing it on first use.
    pub fn load_llm(&self, name: &str) -> AppResult<Arc<dyn LlmClient>> {
        let mut cache = self
            .cache
            .lock()
            .map_err(|_| AppError::Other("LLM cache lock poisoned".to_string()))?;

        if let Some(client) = cache.get(name) {
            return Ok(Arc::clone(client));
        }

        let entry = self.registry.entry(name)?;
        let config = entry.provider_config()?;
        let client = create_client(&config)?;
        cache.insert(name.to_string(), Arc::clone(&client));

        tracing::debug!(name, "Cached LLM client");
        Ok(client)
    }

    /// Name of the designated manager LLM, if any.
    pub fn manager_name(&self) -> Option<&str> {
        self.registry.manager_llm.as_deref()
    }

    pub fn llm_config(&self, name: &str) -> AppResult<&RegistryEntry> {
        self.registry.entry(name)
    }

    pub fn list_available_llms(&self) -> Vec<String> {
        self.registry.names()
    }

    pub fn is_loaded(&self, name: &str) -> bool {
        self.cache
            .lock()
            .map(|cache| cache.contains_key(name))
            .unwrap_or(false)
    }
}

impl LlmSource for LlmLoader {
    fn manager_llm(&self) -> AppResult<Arc<dyn LlmClient>> {
        let name = self.manager_name().ok_or_else(|| {
            AppError::Config("No manager LLM (managerLLM) specified in configuration".to_string())
        })?;

        if !self.registry.llms.contains_key(name) {
            return Err(AppError::Config(format!(
                "Manager LLM '{}' not found in configuration",
                name
            )));
        }

        self.load_llm(name)
    }
}
