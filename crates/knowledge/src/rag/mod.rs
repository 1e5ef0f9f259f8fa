//! Conversational retrieval over the vector store.

pub mod chain;
pub mod memory;
pub mod types;

pub use chain::{RagChatbot, DEFAULT_RETRIEVAL_K};
pub use memory::{estimate_tokens, ConversationMemory};
pub use types::{ChainState, ChatMessage, ChatResponse, Role, NO_DOCUMENTS_ANSWER};
