//! Prompt builder: validates inputs and renders Handlebars templates.

use crate::types::{BuiltPrompt, PromptDefinition};
use handlebars::Handlebars;
use ragbot_core::{AppError, AppResult};
use std::collections::HashMap;

/// Build a prompt from a definition and input variables.
///
/// Every name in `definition.input_variables` must be present in
/// `variables`; values are inserted verbatim (no HTML escaping).
///
/// # Example
/// ```
/// use ragbot_prompt::{build_prompt, default_qa_prompt};
/// use std::collections::HashMap;
///
/// let mut vars = HashMap::new();
/// vars.insert("context".to_string(), "Rust was first released in 2015.".to_string());
/// vars.insert("chat_history".to_string(), String::new());
/// vars.insert("question".to_string(), "When was Rust released?".to_string());
///
/// let built = build_prompt(&default_qa_prompt(), vars).unwrap();
/// assert!(built.user.contains("When was Rust released?"));
/// ```
pub fn build_prompt(
    definition: &PromptDefinition,
    variables: HashMap<String, String>,
) -> AppResult<BuiltPrompt> {
    tracing::debug!("Building prompt: {}", definition.id);

    let missing: Vec<&str> = definition
        .input_variables
        .iter()
        .filter(|name| !variables.contains_key(name.as_str()))
        .map(String::as_str)
        .collect();
    if !missing.is_empty() {
        return Err(AppError::Prompt(format!(
            "Prompt '{}' is missing input variables: {}",
            definition.id,
            missing.join(", ")
        )));
    }

    let user = render_template(&definition.template, &variables)?;

    Ok(BuiltPrompt::new(
        definition.system.clone(),
        user,
        definition.id.clone(),
        variables,
    ))
}

/// Render a Handlebars template with variables.
pub fn render_template(template: &str, variables: &HashMap<String, String>) -> AppResult<String> {
    let mut handlebars = Handlebars::new();

    // Plain text, never HTML
    handlebars.register_escape_fn(handlebars::no_escape);

    handlebars
        .register_template_string("prompt", template)
        .map_err(|e| AppError::Prompt(format!("Failed to register template: {}", e)))?;

    handlebars
        .render("prompt", &variables)
        .map_err(|e| AppError::Prompt(format!("Failed to render template: {}", e)))
}
