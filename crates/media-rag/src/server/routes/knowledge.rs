//! Knowledge base and conversation inspection endpoints

use axum::{extract::State, Json};
use serde::Serialize;

use crate::learning::KnowledgeStats;
use crate::server::state::AppState;
use crate::session::ConversationView;
use crate::types::KnowledgeRecord;

/// Response for the knowledge listing
#[derive(Debug, Serialize)]
pub struct KnowledgeListResponse {
    /// Records in insertion order
    pub records: Vec<KnowledgeRecord>,
    /// Store statistics
    pub stats: KnowledgeStats,
}

/// GET /api/knowledge - List every record added through the chat command
pub async fn list_knowledge(State(state): State<AppState>) -> Json<KnowledgeListResponse> {
    let response = state
        .engine()
        .session()
        .with_knowledge(|store| KnowledgeListResponse {
            records: store.records().to_vec(),
            stats: store.stats(),
        });

    Json(response)
}

/// GET /api/history - Current conversation window
pub async fn get_history(State(state): State<AppState>) -> Json<ConversationView> {
    Json(state.engine().session().with_conversation(|c| c.view()))
}
