//! Provider abstractions for the generative backend
//!
//! The chat engine and video decomposer only see these traits, so the Ollama
//! backend can be swapped or faked.

pub mod llm;
pub mod ollama;

pub use llm::{LlmProvider, TextStream, VisionProvider};
pub use ollama::{OllamaLlm, OllamaProvider, OllamaVision};
