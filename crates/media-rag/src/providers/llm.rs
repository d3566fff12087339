//! Provider traits for the generative backend

use async_trait::async_trait;
use futures::stream::BoxStream;

use crate::error::Result;
use crate::types::PromptPayload;

/// Incremental text fragments from the backend, ended by stream closure
pub type TextStream = BoxStream<'static, Result<String>>;

/// Trait for streamed answer generation
///
/// Implementations:
/// - `OllamaLlm`: local Ollama server (llava, llama3.2-vision, etc.)
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Submit a payload and return its fragment stream.
    ///
    /// Errors before the first fragment come back as `Err`; failures while
    /// streaming arrive as an `Err` item.
    async fn generate_stream(&self, payload: PromptPayload) -> Result<TextStream>;

    /// Check if the provider is healthy and available
    async fn health_check(&self) -> Result<bool>;

    /// Get provider name for logging
    fn name(&self) -> &str;

    /// Get the model being used
    fn model(&self) -> &str;
}

/// Trait for describing a single image with a vision-capable model
#[async_trait]
pub trait VisionProvider: Send + Sync {
    /// Describe a base64-encoded image following `prompt`
    async fn describe_image(&self, image_base64: String, prompt: &str) -> Result<String>;

    /// Get the model being used
    fn model(&self) -> &str;
}
