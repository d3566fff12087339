//! Generation request payload

use serde::Serialize;

/// Body of an Ollama `/api/generate` call.
///
/// Built fresh for every request and sent once.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PromptPayload {
    /// Model name
    pub model: String,
    /// Fully assembled prompt text
    pub prompt: String,
    /// Base64-encoded images attached to this turn
    #[serde(skip_serializing_if = "Option::is_none")]
    pub images: Option<Vec<String>>,
    /// Request incremental NDJSON output
    pub stream: bool,
}

impl PromptPayload {
    /// Streaming payload with an optional attached image
    pub fn streaming(
        model: impl Into<String>,
        prompt: impl Into<String>,
        image: Option<String>,
    ) -> Self {
        Self {
            model: model.into(),
            prompt: prompt.into(),
            images: image.map(|img| vec![img]),
            stream: true,
        }
    }

    /// Non-streaming payload describing a single image
    pub fn describe_image(
        model: impl Into<String>,
        prompt: impl Into<String>,
        image: String,
    ) -> Self {
        Self {
            model: model.into(),
            prompt: prompt.into(),
            images: Some(vec![image]),
            stream: false,
        }
    }

    /// Whether an image rides along with this payload
    pub fn has_image(&self) -> bool {
        self.images.as_ref().is_some_and(|imgs| !imgs.is_empty())
    }
}
