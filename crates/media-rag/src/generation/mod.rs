//! Prompt assembly and streamed answer generation

pub mod dispatcher;
pub mod ollama;
pub mod prompt;

pub use dispatcher::{ResponseStream, StreamingDispatcher};
pub use ollama::OllamaClient;
pub use prompt::{PromptBuilder, VisualContext};
