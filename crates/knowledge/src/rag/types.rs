//! Conversation types.

use crate::types::Chunk;
use ragbot_core::AppError;
use serde::{Deserialize, Serialize};

/// Answer returned when the store holds no documents.
pub const NO_DOCUMENTS_ANSWER: &str =
    "I don't have any documents to answer questions from. Please upload documents first.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }

    /// Speaker label used when history is rendered into a prompt.
    pub fn label(&self) -> &'static str {
        match self {
            Self::User => "Human",
            Self::Assistant => "Assistant",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Result of one chat turn.
#[derive(Debug, Clone, Serialize)]
pub struct ChatResponse {
    pub answer: String,

    /// Chunks the answer was grounded on, most relevant first
    pub source_documents: Vec<Chunk>,
}

impl ChatResponse {
    pub fn no_documents() -> Self {
        Self {
            answer: NO_DOCUMENTS_ANSWER.to_string(),
            source_documents: Vec::new(),
        }
    }

    pub fn from_error(error: &AppError) -> Self {
        Self {
            answer: format!("An error occurred: {}", error),
            source_documents: Vec::new(),
        }
    }
}

/// Lifecycle of the chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChainState {
    /// No documents indexed yet
    Uninitialized,
    Ready,
    /// A turn is in progress
    Responding,
}

impl ChainState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Uninitialized => "uninitialized",
            Self::Ready => "ready",
            Self::Responding => "responding",
        }
    }
}
