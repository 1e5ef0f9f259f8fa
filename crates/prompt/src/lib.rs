//! Prompt system for ragbot.
//!
//! - Handlebars template rendering with declared input variables
//! - Built-in QA and question-condensing prompts
//! - YAML prompt overrides

pub mod builder;
pub mod defaults;
pub mod loader;
pub mod types;

// Re-export main types
pub use builder::{build_prompt, render_template};
pub use defaults::{default_condense_prompt, default_qa_prompt};
pub use loader::{load_prompt, load_qa_prompt};
pub use types::{BuiltPrompt, BuiltPromptMetadata, PromptDefinition};
