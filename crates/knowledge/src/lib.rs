//! Documents in, grounded answers out.
//!
//! - [`processor`]: load supported files and split them into chunks
//! - [`store`]: embed chunks into a persisted LanceDB collection and search it
//! - [`rag`]: the conversational chain that answers from retrieved chunks
//!
//! # Example
//! ```no_run
//! use ragbot_core::AppConfig;
//! use ragbot_knowledge::{DocumentProcessor, LanceDbStore, RagChatbot};
//! use ragbot_llm::{LlmLoader, LlmSource};
//! use std::path::Path;
//! use std::sync::Arc;
//!
//! # async fn example() -> ragbot_core::AppResult<()> {
//! let config = AppConfig::load(None)?;
//! let llms: Arc<dyn LlmSource> = Arc::new(LlmLoader::from_file(&config.llm_config_path)?);
//! let store = Arc::new(LanceDbStore::from_config(&config).await?);
//! let chatbot = RagChatbot::from_config(&config, llms, store).await?;
//!
//! let processor = DocumentProcessor::from_config(&config)?;
//! let chunks = processor.process_document(Path::new("handbook.pdf"))?;
//! chatbot.add_chunks(&chunks).await?;
//!
//! let response = chatbot.chat("How many vacation days do I get?").await;
//! println!("{}", response.answer);
//! # Ok(())
//! # }
//! ```

pub mod embeddings;
pub mod ingest;
pub mod loaders;
pub mod processor;
pub mod rag;
pub mod splitter;
pub mod store;
pub mod types;

pub use embeddings::{create_provider, EmbeddingConfig, EmbeddingProvider};
pub use ingest::{ingest_file, ingest_files, IngestOutcome};
pub use loaders::{supported_extensions, DocumentFormat, SUPPORTED_EXTENSIONS};
pub use processor::DocumentProcessor;
pub use rag::{ChainState, ChatMessage, ChatResponse, RagChatbot, Role};
pub use splitter::DocumentSplitter;
pub use store::{LanceDbStore, MetadataFilter, VectorIndex};
pub use types::{BatchOutcome, Chunk, ChunkMetadata, Document, DocumentMetadata, ScoredChunk};
