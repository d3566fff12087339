//! Core data types

pub mod content;
pub mod file;
pub mod knowledge;
pub mod prompt;

pub use content::{ExtractedContent, FrameDescription, VideoSummary};
pub use file::FileType;
pub use knowledge::KnowledgeRecord;
pub use prompt::PromptPayload;
