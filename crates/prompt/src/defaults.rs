//! Built-in prompts used by the conversational chain.

use crate::types::PromptDefinition;

pub const QA_PROMPT_ID: &str = "rag.qa.default";
pub const CONDENSE_PROMPT_ID: &str = "rag.condense.default";

const QA_TEMPLATE: &str = "You are a helpful AI assistant that answers questions based on the provided context from documents.
Use the following pieces of context to answer the question at the end. If you don't know the answer or if the context doesn't contain relevant information, just say that you don't know, don't try to make up an answer.

Always provide detailed and accurate answers based on the context. If you reference specific information, try to indicate which part of the context it came from.

Context:
{{context}}

Chat History:
{{chat_history}}

Question: {{question}}

Helpful Answer:";

const CONDENSE_TEMPLATE: &str = "Given the following conversation and a follow up question, rephrase the follow up question to be a standalone question, in its original language.

Chat History:
{{chat_history}}
Follow Up Input: {{question}}
Standalone question:";

/// Answer prompt: `context`, `chat_history`, `question`.
pub fn default_qa_prompt() -> PromptDefinition {
    PromptDefinition {
        id: QA_PROMPT_ID.to_string(),
        title: "Document question answering".to_string(),
        api_version: "1.0".to_string(),
        input_variables: vec![
            "context".to_string(),
            "chat_history".to_string(),
            "question".to_string(),
        ],
        system: None,
        template: QA_TEMPLATE.to_string(),
    }
}

/// Rewrites a follow-up into a standalone question: `chat_history`, `question`.
pub fn default_condense_prompt() -> PromptDefinition {
    PromptDefinition {
        id: CONDENSE_PROMPT_ID.to_string(),
        title: "Standalone question".to_string(),
        api_version: "1.0".to_string(),
        input_variables: vec!["chat_history".to_string(), "question".to_string()],
        system: None,
        template: CONDENSE_TEMPLATE.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build_prompt;
    use std::collections::HashMap;

    #[test]
    fn test_qa_prompt_renders_all_sections() {
        let mut vars = HashMap::new();
        vars.insert("context".to_string(), "The warranty lasts two years.".to_string());
        vars.insert("chat_history".to_string(), "Human: hi\nAssistant: hello".to_string());
        vars.insert("question".to_string(), "How long is the warranty?".to_string());

        let built = build_prompt(&default_qa_prompt(), vars).unwrap();
        assert!(built.user.contains("Context:\nThe warranty lasts two years."));
        assert!(built.user.contains("Chat History:\nHuman: hi"));
        assert!(built.user.ends_with("Question: How long is the warranty?\n\nHelpful Answer:"));
    }

    #[test]
    fn test_condense_prompt_inputs() {
        let def = default_condense_prompt();
        assert_eq!(def.input_variables, vec!["chat_history", "question"]);
    }
}
