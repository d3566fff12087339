//! media-rag: multimodal chat over uploaded files and videos
//!
//! Uploads (images, PDF, DOCX, CSV, XLSX, MP4) are converted to text, folded
//! into a short conversation window, merged with keyword-retrieved knowledge
//! records, and sent to an Ollama model whose answer is streamed back to the
//! caller fragment by fragment.

pub mod config;
pub mod engine;
pub mod error;
pub mod generation;
pub mod ingestion;
pub mod learning;
pub mod providers;
pub mod retrieval;
pub mod server;
pub mod session;
pub mod storage;
pub mod types;

#[cfg(test)]
mod testing;

pub use config::RagConfig;
pub use engine::{ChatEngine, Upload};
pub use error::{Error, Result};
pub use types::{ExtractedContent, FileType, FrameDescription, KnowledgeRecord, VideoSummary};
