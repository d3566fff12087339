//! Knowledge store records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A user-submitted snippet held by the knowledge store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeRecord {
    /// Process-unique, strictly increasing id starting at 1
    pub id: u64,
    /// Text exactly as submitted
    pub content: String,
    /// Lowercased whitespace tokens longer than three characters, in order
    pub keywords: Vec<String>,
    /// When the record was added
    pub created_at: DateTime<Utc>,
}

impl KnowledgeRecord {
    /// Build a record, deriving its keywords from the content
    pub fn new(id: u64, content: impl Into<String>) -> Self {
        let content = content.into();
        let keywords = extract_keywords(&content);
        Self {
            id,
            content,
            keywords,
            created_at: Utc::now(),
        }
    }

    /// Line used when the record is folded into a prompt
    pub fn prompt_line(&self) -> String {
        format!("Retrieved Document {}: {}", self.id, self.content)
    }
}

/// Keywords are lowercase whitespace tokens with more than three characters
pub fn extract_keywords(content: &str) -> Vec<String> {
    content
        .to_lowercase()
        .split_whitespace()
        .filter(|word| word.chars().count() > 3)
        .map(str::to_string)
        .collect()
}
