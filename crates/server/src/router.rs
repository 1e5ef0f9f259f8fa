use axum::extract::DefaultBodyLimit;
use axum::routing::{delete, get, post};
use axum::Router;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::handlers::{chat, documents, health};
use crate::state::ServerState;

/// Largest accepted request body (uploads).
const MAX_BODY_BYTES: usize = 100 * 1024 * 1024;

/// Creates the application router with all routes and middleware.
pub fn router(state: Arc<ServerState>) -> Router {
    Router::new()
        .route("/", get(health::root))
        .route("/status", get(health::status))
        .route("/upload", post(documents::upload))
        .route("/documents", delete(documents::delete_all))
        .route("/search", get(documents::search))
        .route("/chat", post(chat::chat))
        .route("/history", get(chat::history))
        .route("/clear", post(chat::clear))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
