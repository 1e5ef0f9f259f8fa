//! Token-bounded conversation buffer.

use super::types::{ChatMessage, Role};
use std::collections::VecDeque;

/// Rough token count: `ceil(words / 0.75)`.
pub fn estimate_tokens(text: &str) -> usize {
    let words = text.split_whitespace().count();
    (words * 4).div_ceil(3)
}

/// Ordered messages whose estimated size stays within `max_tokens`.
///
/// Adding a message that pushes the total over budget evicts the oldest
/// messages until it fits again.
#[derive(Debug, Clone)]
pub struct ConversationMemory {
    messages: VecDeque<ChatMessage>,
    max_tokens: usize,
    tokens: usize,
}

impl ConversationMemory {
    pub fn new(max_tokens: usize) -> Self {
        Self {
            messages: VecDeque::new(),
            max_tokens,
            tokens: 0,
        }
    }

    pub fn push(&mut self, message: ChatMessage) {
        self.append(message);
        self.trim();
    }

    /// Record a question and its answer, then trim once.
    ///
    /// History never starts with an answer whose question was evicted.
    pub fn add_exchange(&mut self, question: &str, answer: &str) {
        self.append(ChatMessage::user(question));
        self.append(ChatMessage::assistant(answer));
        self.trim();

        while self.messages.front().map(|m| m.role) == Some(Role::Assistant) {
            self.evict_oldest();
        }
    }

    fn append(&mut self, message: ChatMessage) {
        self.tokens += estimate_tokens(&message.content);
        self.messages.push_back(message);
    }

    fn trim(&mut self) {
        while self.tokens > self.max_tokens && !self.messages.is_empty() {
            self.evict_oldest();
        }
    }

    fn evict_oldest(&mut self) {
        if let Some(oldest) = self.messages.pop_front() {
            self.tokens -= estimate_tokens(&oldest.content);
            tracing::debug!(role = oldest.role.as_str(), "Evicted message from memory");
        }
    }

    pub fn messages(&self) -> Vec<ChatMessage> {
        self.messages.iter().cloned().collect()
    }

    /// History as `Human:` / `Assistant:` lines for prompt templates.
    pub fn render(&self) -> String {
        self.messages
            .iter()
            .map(|m| format!("{}: {}", m.role.label(), m.content))
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn clear(&mut self) {
        self.messages.clear();
        self.tokens = 0;
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn token_count(&self) -> usize {
        self.tokens
    }

    pub fn max_tokens(&self) -> usize {
        self.max_tokens
    }

    pub fn last_role(&self) -> Option<Role> {
        self.messages.back().map(|m| m.role)
    }
}
