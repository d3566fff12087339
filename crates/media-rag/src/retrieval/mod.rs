//! Keyword-similarity retrieval over the in-memory knowledge store

pub mod search;
pub mod similarity;

pub use search::{KeywordRetriever, SearchResult};
pub use similarity::sequence_ratio;
