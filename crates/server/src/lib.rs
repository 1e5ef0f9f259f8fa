//! HTTP API over the document chatbot.
//!
//! | Method | Path         | Purpose                                   |
//! |--------|--------------|-------------------------------------------|
//! | GET    | `/`          | Service name and endpoint map             |
//! | GET    | `/status`    | Indexed documents, LLMs, chain state      |
//! | POST   | `/upload`    | Multipart `files`, parsed and indexed     |
//! | POST   | `/chat`      | `{question, session_id?}` → answer        |
//! | GET    | `/history`   | Conversation so far                       |
//! | POST   | `/clear`     | Forget the conversation                   |
//! | DELETE | `/documents` | Drop the collection and uploaded files    |
//! | GET    | `/search`    | `?query=&k=` scored chunks, no generation |

pub mod error;
mod handlers;
pub mod router;
pub mod state;

pub use error::ApiError;
pub use router::router;
pub use state::ServerState;

use ragbot_core::{AppError, AppResult};
use std::sync::Arc;
use tokio::net::TcpListener;

/// Bind `addr` and serve until the process is stopped.
pub async fn serve(state: Arc<ServerState>, addr: &str) -> AppResult<()> {
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| AppError::Config(format!("Failed to bind {}: {}", addr, e)))?;

    tracing::info!(
        addr = %addr,
        llms = ?state.llms.list_available_llms(),
        "Server ready"
    );

    axum::serve(listener, router(state))
        .await
        .map_err(|e| AppError::Other(format!("Server error: {}", e)))
}
