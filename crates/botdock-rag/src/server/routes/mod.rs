//! API routes for the retrieval service

pub mod bots;
pub mod documents;
pub mod jobs;
pub mod search;

use axum::{
    routing::{delete, get, post},
    Router,
};

use crate::server::state::AppState;

/// Build all API routes
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // Bot registry
        .route("/bots", post(bots::create_bot))
        .route("/bots/:bot_id", get(bots::get_bot))
        // Documents and ingestion
        .route("/bots/:bot_id/documents", post(documents::upload_document))
        .route("/bots/:bot_id/documents", get(documents::list_documents))
        .route(
            "/bots/:bot_id/documents/:document_id",
            delete(documents::delete_document),
        )
        .route("/documents/:document_id/status", get(documents::get_status))
        // Semantic search
        .route("/bots/:bot_id/search", post(search::search))
        // Queue observability
        .route("/jobs", get(jobs::queue_stats))
        // Info
        .route("/info", get(info))
}

/// API info endpoint
async fn info() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({
        "name": "botdock-rag",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "Document ingestion and semantic retrieval for Botdock bots",
        "endpoints": {
            "POST /api/bots": "Create a bot",
            "GET /api/bots/:id": "Get a bot",
            "POST /api/bots/:id/documents": "Upload a document for ingestion",
            "GET /api/bots/:id/documents": "List a bot's documents",
            "GET /api/documents/:id/status": "Poll ingestion progress",
            "DELETE /api/bots/:id/documents/:id": "Delete a document and its embeddings",
            "POST /api/bots/:id/search": "Semantic search over a bot's corpus",
            "GET /api/jobs": "Ingest queue statistics"
        }
    }))
}
