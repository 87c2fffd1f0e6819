//! Router configuration for the web server.

use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::limit::RequestBodyLimitLayer;

use super::handlers;
use super::AppState;

/// Create the main router with all routes.
pub fn create_router(state: AppState) -> Router {
    let body_limit = state.settings.server.max_upload_bytes;

    Router::new()
        .route("/", get(handlers::index))
        .route("/api/health", get(handlers::health))
        // Assistant
        .route("/api/assistant/upload", post(handlers::upload_file))
        .route("/api/assistant/files", get(handlers::list_files))
        .route("/api/assistant/files/:file_id", delete(handlers::delete_file))
        .route("/api/assistant/chat", post(handlers::chat))
        .route("/api/assistant/messages", get(handlers::list_messages))
        // Recent bills
        .route("/api/bills/scrape", post(handlers::scrape_bills))
        .route("/api/bills", get(handlers::list_bills))
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(body_limit))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
