//! Append-only knowledge store populated by explicit user commands

use serde::Serialize;

use crate::types::KnowledgeRecord;

/// In-memory collection of user-submitted records.
///
/// Records are never mutated or removed, and nothing survives a restart.
#[derive(Debug)]
pub struct KnowledgeStore {
    records: Vec<KnowledgeRecord>,
    next_id: u64,
}

impl Default for KnowledgeStore {
    fn default() -> Self {
        Self::new()
    }
}

impl KnowledgeStore {
    /// Create an empty store; the first record gets id 1
    pub fn new() -> Self {
        Self {
            records: Vec::new(),
            next_id: 1,
        }
    }

    /// Add a record and return the confirmation shown to the user.
    ///
    /// Empty content is rejected by the caller, not here.
    pub fn add(&mut self, content: &str) -> String {
        let record = self.insert(content);
        format!("Added to knowledge base: {}", record.content)
    }

    /// Add a record and return it
    pub fn insert(&mut self, content: &str) -> &KnowledgeRecord {
        let record = KnowledgeRecord::new(self.next_id, content);
        self.next_id += 1;

        tracing::info!(
            "Knowledge record {} added ({} keywords)",
            record.id,
            record.keywords.len()
        );

        self.records.push(record);
        &self.records[self.records.len() - 1]
    }

    /// All records in insertion order
    pub fn records(&self) -> &[KnowledgeRecord] {
        &self.records
    }

    /// Number of records
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// True when nothing has been added yet
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Get statistics about stored knowledge
    pub fn stats(&self) -> KnowledgeStats {
        let mut keywords: Vec<&str> = self
            .records
            .iter()
            .flat_map(|r| r.keywords.iter().map(String::as_str))
            .collect();
        keywords.sort_unstable();
        keywords.dedup();

        KnowledgeStats {
            total_records: self.records.len(),
            unique_keywords: keywords.len(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct KnowledgeStats {
    pub total_records: usize,
    pub unique_keywords: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_confirms_content() {
        let mut store = KnowledgeStore::new();
        let reply = store.add("The quarterly report shows strong revenue growth");
        assert_eq!(
            reply,
            "Added to knowledge base: The quarterly report shows strong revenue growth"
        );
        assert_eq!(store.len(), 1);
        assert_eq!(store.records()[0].id, 1);
    }

    #[test]
    fn test_ids_strictly_increasing() {
        let mut store = KnowledgeStore::new();
        for i in 0..50 {
            store.add(&format!("note number {}", i));
        }

        let ids: Vec<u64> = store.records().iter().map(|r| r.id).collect();
        assert_eq!(ids.first(), Some(&1));
        assert!(ids.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(store.records()[24].content, "note number 24");
        assert_eq!(store.records()[24].id, 25);
    }

    #[test]
    fn test_stats() {
        let mut store = KnowledgeStore::new();
        store.add("rust tokio rust");
        store.add("tokio axum");

        let stats = store.stats();
        assert_eq!(stats.total_records, 2);
        assert_eq!(stats.unique_keywords, 3);
    }
}
