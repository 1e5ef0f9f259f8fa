//! Loading prompt overrides from YAML files.

use crate::defaults::default_qa_prompt;
use crate::types::PromptDefinition;
use ragbot_core::{AppError, AppResult};
use std::path::Path;

/// Variables every QA prompt must declare.
pub const QA_INPUTS: [&str; 3] = ["context", "chat_history", "question"];

/// Load a prompt definition from a YAML file.
///
/// # Example
/// ```no_run
/// use ragbot_prompt::load_prompt;
/// use std::path::Path;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let prompt = load_prompt(Path::new("prompts/qa.yml"))?;
/// println!("Loaded prompt: {}", prompt.id);
/// # Ok(())
/// # }
/// ```
pub fn load_prompt(path: &Path) -> AppResult<PromptDefinition> {
    tracing::debug!("Loading prompt from: {:?}", path);

    if !path.exists() {
        return Err(AppError::Prompt(format!("Prompt file not found: {:?}", path)));
    }

    let contents = std::fs::read_to_string(path)
        .map_err(|e| AppError::Prompt(format!("Failed to read prompt file {:?}: {}", path, e)))?;

    let definition: PromptDefinition = serde_yaml::from_str(&contents)
        .map_err(|e| AppError::Prompt(format!("Failed to parse prompt YAML {:?}: {}", path, e)))?;

    validate_prompt(&definition)?;

    tracing::info!("Loaded prompt: {} ({})", definition.id, definition.title);

    Ok(definition)
}

/// The QA prompt: the built-in one, or the file override when given.
///
/// An override must declare `context`, `chat_history` and `question`.
pub fn load_qa_prompt(path: Option<&Path>) -> AppResult<PromptDefinition> {
    let Some(path) = path else {
        return Ok(default_qa_prompt());
    };

    let definition = load_prompt(path)?;
    let missing: Vec<&str> = QA_INPUTS
        .iter()
        .copied()
        .filter(|name| !definition.input_variables.iter().any(|v| v == name))
        .collect();

    if !missing.is_empty() {
        return Err(AppError::Prompt(format!(
            "Prompt '{}' must declare input variables: {}",
            definition.id,
            missing.join(", ")
        )));
    }

    Ok(definition)
}

fn validate_prompt(def: &PromptDefinition) -> AppResult<()> {
    if def.id.is_empty() {
        return Err(AppError::Prompt("Prompt ID cannot be empty".to_string()));
    }

    if def.template.trim().is_empty() {
        return Err(AppError::Prompt("Prompt template cannot be empty".to_string()));
    }

    if !def.api_version.contains('.') {
        return Err(AppError::Prompt(format!(
            "Invalid apiVersion format: {}. Expected format: 'x.y'",
            def.api_version
        )));
    }

    Ok(())
}
