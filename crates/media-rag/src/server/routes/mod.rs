//! API routes for the chat server

pub mod chat;
pub mod knowledge;

use axum::{
    extract::{DefaultBodyLimit, State},
    routing::{get, post},
    Json, Router,
};

use crate::server::state::AppState;

/// Build all API routes
pub fn api_routes(max_upload_size: usize) -> Router<AppState> {
    Router::new()
        // Chat - with larger body limit for file uploads
        .route(
            "/chat",
            post(chat::chat).layer(DefaultBodyLimit::max(max_upload_size)),
        )
        // Inspection
        .route("/knowledge", get(knowledge::list_knowledge))
        .route("/history", get(knowledge::get_history))
        // Info
        .route("/info", get(info))
}

/// API info endpoint
async fn info(State(state): State<AppState>) -> Json<serde_json::Value> {
    let config = state.config();

    Json(serde_json::json!({
        "name": "media-rag",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "Multimodal chat over uploaded files and videos with keyword retrieval",
        "models": {
            "chat": config.llm.generate_model,
            "vision": config.llm.vision_model,
            "speech": config.speech.model,
        },
        "endpoints": {
            "POST /api/chat": "Ask a question, optionally with a file (streamed text/plain)",
            "GET /api/knowledge": "List knowledge base records",
            "GET /api/history": "Current conversation window",
            "GET /health": "Liveness",
            "GET /ready": "Readiness, including the generation backend"
        },
        "supported_formats": ["jpg", "jpeg", "png", "pdf", "docx", "csv", "xlsx", "mp4"],
        "commands": {
            "add to knowledge base: <text>": "Store <text> for retrieval in later turns"
        }
    }))
}
