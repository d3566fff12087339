//! Lexical retrieval over the knowledge store

use std::cmp::Ordering;

use crate::learning::KnowledgeStore;
use crate::types::KnowledgeRecord;

use super::similarity::sequence_ratio;

/// A retrieved record with its similarity mass
#[derive(Debug, Clone)]
pub struct SearchResult {
    /// The matched record
    pub record: KnowledgeRecord,
    /// Sum of token/keyword similarity ratios
    pub score: f64,
}

/// Soft keyword matcher: every query token is compared against every record
/// keyword, so typos and stemming variants still contribute.
///
/// Scores are not normalized by keyword count; records with more keywords
/// accumulate more mass.
#[derive(Debug, Clone, Copy)]
pub struct KeywordRetriever {
    top_k: usize,
}

impl KeywordRetriever {
    /// Create a retriever returning at most `top_k` records
    pub fn new(top_k: usize) -> Self {
        Self { top_k }
    }

    /// Top records for `query`, best first
    pub fn retrieve(&self, store: &KnowledgeStore, query: &str) -> Vec<KnowledgeRecord> {
        self.search(store, query)
            .into_iter()
            .map(|result| result.record)
            .collect()
    }

    /// Scored top records for `query`, ordered by non-increasing score.
    ///
    /// Ties keep insertion order.
    pub fn search(&self, store: &KnowledgeStore, query: &str) -> Vec<SearchResult> {
        if store.is_empty() {
            return Vec::new();
        }

        let query_tokens: Vec<String> = query
            .to_lowercase()
            .split_whitespace()
            .map(str::to_string)
            .collect();

        let mut scored: Vec<SearchResult> = store
            .records()
            .iter()
            .map(|record| SearchResult {
                score: score_record(&query_tokens, record),
                record: record.clone(),
            })
            .collect();

        // sort_by is stable
        scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
        scored.truncate(self.top_k);

        tracing::debug!(
            "Retrieved {} of {} records for \"{}\"",
            scored.len(),
            store.len(),
            query
        );

        scored
    }
}

/// Sum of similarity over every (query token, keyword) pair
pub fn score_record(query_tokens: &[String], record: &KnowledgeRecord) -> f64 {
    query_tokens
        .iter()
        .flat_map(|token| {
            record
                .keywords
                .iter()
                .map(move |keyword| sequence_ratio(token, keyword))
        })
        .sum()
}
