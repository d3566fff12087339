//! Ollama client for streamed generation and image description

use futures_util::StreamExt;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tokio::time::sleep;

use crate::config::LlmConfig;
use crate::error::{Error, Result};
use crate::providers::TextStream;
use crate::types::PromptPayload;

/// Returned when the backend answers without a `response` field
pub const MISSING_DESCRIPTION: &str = "Error processing image.";

/// Ollama API client
pub struct OllamaClient {
    /// HTTP client
    client: Client,
    /// Configuration
    config: LlmConfig,
}

#[derive(Deserialize)]
struct GenerateResponse {
    response: Option<String>,
}

impl OllamaClient {
    /// Create a new Ollama client
    pub fn new(config: &LlmConfig) -> Result<Self> {
        // No overall timeout: streamed answers can run for minutes.
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .pool_max_idle_per_host(5)
            .build()?;

        Ok(Self {
            client,
            config: config.clone(),
        })
    }

    fn generate_url(&self) -> String {
        format!("{}/api/generate", self.config.base_url.trim_end_matches('/'))
    }

    /// Retry a request with exponential backoff
    async fn retry_request<F, Fut, T>(&self, operation: F) -> Result<T>
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = Result<T>>,
    {
        let max_retries = self.config.max_retries;
        let mut last_error = None;

        for attempt in 0..=max_retries {
            match operation().await {
                Ok(result) => return Ok(result),
                Err(e) => {
                    last_error = Some(e);
                    if attempt < max_retries {
                        let delay = Duration::from_secs(2u64.pow(attempt));
                        tracing::warn!(
                            "Request failed (attempt {}/{}), retrying in {:?}",
                            attempt + 1,
                            max_retries + 1,
                            delay
                        );
                        sleep(delay).await;
                    }
                }
            }
        }

        Err(last_error.unwrap_or_else(|| Error::Llm("Unknown error".to_string())))
    }

    /// Check if Ollama is available
    pub async fn health_check(&self) -> Result<bool> {
        let url = format!("{}/api/tags", self.config.base_url.trim_end_matches('/'));

        match self.client.get(&url).send().await {
            Ok(response) => Ok(response.status().is_success()),
            Err(_) => Ok(false),
        }
    }

    /// Describe one image with a vision model (non-streaming)
    pub async fn describe_image(
        &self,
        model: &str,
        prompt: &str,
        image_base64: String,
    ) -> Result<String> {
        let url = self.generate_url();
        let payload = PromptPayload::describe_image(model, prompt, image_base64);
        let timeout = Duration::from_secs(self.config.request_timeout_secs);
        let client = self.client.clone();

        self.retry_request(|| {
            let url = url.clone();
            let payload = payload.clone();
            let client = client.clone();

            async move {
                let response = client
                    .post(&url)
                    .timeout(timeout)
                    .json(&payload)
                    .send()
                    .await
                    .map_err(|e| Error::Llm(format!("Description request failed: {}", e)))?;

                if !response.status().is_success() {
                    let status = response.status();
                    let body = response.text().await.unwrap_or_default();
                    return Err(Error::Llm(format!(
                        "Description failed: HTTP {} - {}",
                        status, body
                    )));
                }

                let generate_response: GenerateResponse = response.json().await.map_err(|e| {
                    Error::Llm(format!("Failed to parse description response: {}", e))
                })?;

                Ok(generate_response
                    .response
                    .unwrap_or_else(|| MISSING_DESCRIPTION.to_string()))
            }
        })
        .await
    }

    /// Submit a streaming payload and decode its NDJSON body into fragments.
    ///
    /// Not retried: a failure is reported once to the caller.
    pub async fn generate_stream(&self, payload: &PromptPayload) -> Result<TextStream> {
        tracing::info!(
            "Streaming answer with model: {} (image attached: {})",
            payload.model,
            payload.has_image()
        );

        let response = self
            .client
            .post(self.generate_url())
            .json(payload)
            .send()
            .await
            .map_err(|e| Error::Llm(format!("Stream request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Llm(format!("Stream failed: HTTP {} - {}", status, body)));
        }

        let mut bytes = response.bytes_stream();

        let stream = async_stream::stream! {
            let mut decoder = NdjsonDecoder::default();
            let mut finished = false;

            while !finished {
                let events = match bytes.next().await {
                    Some(Ok(chunk)) => decoder.push(&chunk),
                    Some(Err(e)) => vec![Err(Error::Llm(format!("Stream error: {}", e)))],
                    None => {
                        finished = true;
                        decoder.finish()
                    }
                };

                for event in events {
                    match event {
                        Ok(StreamEvent::Fragment(text)) => yield Ok(text),
                        Ok(StreamEvent::Done) => {
                            finished = true;
                            break;
                        }
                        Err(e) => {
                            yield Err(e);
                            finished = true;
                            break;
                        }
                    }
                }
            }
        };

        let stream: TextStream = Box::pin(stream);
        Ok(stream)
    }
}

/// One decoded NDJSON event
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    /// Incremental `response` text
    Fragment(String),
    /// The backend marked the stream complete
    Done,
}

#[derive(Deserialize)]
struct StreamChunk {
    #[serde(default)]
    response: String,
    #[serde(default)]
    done: bool,
    #[serde(default)]
    error: Option<String>,
}

/// Line-buffered NDJSON decoder; objects may be split across HTTP chunks
#[derive(Debug, Default)]
pub struct NdjsonDecoder {
    buffer: Vec<u8>,
}

impl NdjsonDecoder {
    /// Feed raw bytes and decode every complete line
    pub fn push(&mut self, bytes: &[u8]) -> Vec<Result<StreamEvent>> {
        self.buffer.extend_from_slice(bytes);

        let mut events = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            decode_line(&line, &mut events);
        }
        events
    }

    /// Decode whatever is left once the body ends without a trailing newline
    pub fn finish(&mut self) -> Vec<Result<StreamEvent>> {
        let line = std::mem::take(&mut self.buffer);
        let mut events = Vec::new();
        decode_line(&line, &mut events);
        events
    }
}

fn decode_line(line: &[u8], events: &mut Vec<Result<StreamEvent>>) {
    let text = String::from_utf8_lossy(line);
    let text = text.trim();
    if text.is_empty() {
        return;
    }

    match serde_json::from_str::<StreamChunk>(text) {
        Ok(chunk) => {
            if let Some(error) = chunk.error {
                events.push(Err(Error::Llm(error)));
                return;
            }
            if !chunk.response.is_empty() {
                events.push(Ok(StreamEvent::Fragment(chunk.response)));
            }
            if chunk.done {
                events.push(Ok(StreamEvent::Done));
            }
        }
        Err(e) => events.push(Err(Error::Llm(format!("Malformed stream line: {}", e)))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fragments(events: Vec<Result<StreamEvent>>) -> Vec<String> {
        events
            .into_iter()
            .filter_map(|e| match e {
                Ok(StreamEvent::Fragment(text)) => Some(text),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_decodes_lines_split_across_chunks() {
        let mut decoder = NdjsonDecoder::default();

        let first = decoder.push(br#"{"response":"Hel","done":false}
{"respon"#);
        assert_eq!(fragments(first), vec!["Hel"]);

        let second = decoder.push(br#"se":"lo","done":false}
"#);
        assert_eq!(fragments(second), vec!["lo"]);

        let last = decoder.push(b"{\"response\":\"\",\"done\":true}\n");
        assert_eq!(last.len(), 1);
        assert!(matches!(last[0], Ok(StreamEvent::Done)));
    }

    #[test]
    fn test_finish_flushes_unterminated_line() {
        let mut decoder = NdjsonDecoder::default();
        assert!(decoder.push(br#"{"response":"tail"}"#).is_empty());
        assert_eq!(fragments(decoder.finish()), vec!["tail"]);
        assert!(decoder.finish().is_empty());
    }

    #[test]
    fn test_error_field_and_garbage_surface_as_errors() {
        let mut decoder = NdjsonDecoder::default();
        let events = decoder.push(b"{\"error\":\"model not found\"}\nnot json\n\n");
        assert_eq!(events.len(), 2);
        assert!(matches!(&events[0], Err(Error::Llm(msg)) if msg == "model not found"));
        assert!(events[1].is_err());
    }

    #[tokio::test]
    async fn test_unreachable_backend_fails_before_streaming() {
        let config = LlmConfig {
            base_url: "http://127.0.0.1:9".to_string(),
            connect_timeout_secs: 1,
            ..LlmConfig::default()
        };
        let client = OllamaClient::new(&config).unwrap();

        let payload = PromptPayload::streaming("llava:7b", "hi", None);
        assert!(client.generate_stream(&payload).await.is_err());
        assert!(!client.health_check().await.unwrap());
    }
}
