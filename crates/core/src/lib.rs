//! Ragbot Core Library
//!
//! Foundational pieces shared by every ragbot crate:
//! - Error handling (`AppError`, `AppResult`)
//! - Logging bootstrap
//! - Application configuration

pub mod config;
pub mod error;
pub mod logging;

// Re-export commonly used types
pub use config::{AppConfig, EmbeddingSettings};
pub use error::{AppError, AppResult};
