//! Ollama-based providers for streamed generation and frame description
//!
//! Wraps the shared OllamaClient to implement the provider traits.

use async_trait::async_trait;
use std::sync::Arc;

use crate::config::LlmConfig;
use crate::error::Result;
use crate::generation::OllamaClient;
use crate::types::PromptPayload;

use super::llm::{LlmProvider, TextStream, VisionProvider};

/// Ollama LLM provider for the streamed chat answer
pub struct OllamaLlm {
    client: Arc<OllamaClient>,
    model: String,
}

impl OllamaLlm {
    /// Create from existing OllamaClient
    pub fn from_client(client: Arc<OllamaClient>, model: String) -> Self {
        Self { client, model }
    }
}

#[async_trait]
impl LlmProvider for OllamaLlm {
    async fn generate_stream(&self, payload: PromptPayload) -> Result<TextStream> {
        self.client.generate_stream(&payload).await
    }

    async fn health_check(&self) -> Result<bool> {
        self.client.health_check().await
    }

    fn name(&self) -> &str {
        "ollama"
    }

    fn model(&self) -> &str {
        &self.model
    }
}

/// Ollama vision provider used for video frames
pub struct OllamaVision {
    client: Arc<OllamaClient>,
    model: String,
}

impl OllamaVision {
    /// Create from existing OllamaClient
    pub fn from_client(client: Arc<OllamaClient>, model: String) -> Self {
        Self { client, model }
    }
}

#[async_trait]
impl VisionProvider for OllamaVision {
    async fn describe_image(&self, image_base64: String, prompt: &str) -> Result<String> {
        self.client
            .describe_image(&self.model, prompt, image_base64)
            .await
    }

    fn model(&self) -> &str {
        &self.model
    }
}

/// Combined Ollama provider that shares a single client for chat and vision
pub struct OllamaProvider {
    llm: OllamaLlm,
    vision: OllamaVision,
}

impl OllamaProvider {
    /// Create a new combined Ollama provider
    pub fn new(config: &LlmConfig) -> Result<Self> {
        let client = Arc::new(OllamaClient::new(config)?);
        Ok(Self {
            llm: OllamaLlm::from_client(Arc::clone(&client), config.generate_model.clone()),
            vision: OllamaVision::from_client(client, config.vision_model.clone()),
        })
    }

    /// Split into separate providers
    pub fn split(self) -> (OllamaLlm, OllamaVision) {
        (self.llm, self.vision)
    }
}
