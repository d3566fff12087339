//! User-populated knowledge base

pub mod knowledge_store;

pub use knowledge_store::{KnowledgeStats, KnowledgeStore};
