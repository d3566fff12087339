//! Speech-to-text for video audio tracks

use async_trait::async_trait;
use reqwest::{multipart, Client};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

use crate::config::SpeechConfig;

/// Transcript placeholder for clips without an audio track
pub const NO_AUDIO: &str = "No audio detected.";

/// Transcript placeholder when recognition returned nothing intelligible
pub const UNINTELLIGIBLE_AUDIO: &str = "Could not understand the audio.";

/// Error type for speech recognition.
#[derive(Debug, Error)]
pub enum SpeechError {
    /// The recognition service could not be reached or rejected the request.
    #[error("{0}")]
    Request(String),

    /// The service answered but found no intelligible speech.
    #[error("could not understand the audio")]
    UnknownValue,

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Anything else.
    #[error("{0}")]
    Other(String),
}

impl SpeechError {
    /// Transcript text shown in place of a failed recognition
    pub fn fallback_text(&self) -> String {
        match self {
            Self::Request(msg) => format!("Speech recognition failed (network issue): {}", msg),
            Self::UnknownValue => UNINTELLIGIBLE_AUDIO.to_string(),
            other => format!("Speech recognition failed: {}", other),
        }
    }
}

/// Trait for transcribing an audio file.
#[async_trait]
pub trait SpeechRecognizer: Send + Sync {
    /// Transcribe a WAV file.
    async fn transcribe(&self, audio: &Path) -> Result<String, SpeechError>;

    /// Recognizer name for logging.
    fn name(&self) -> &str;
}

/// Recognizer backed by an OpenAI-compatible `/v1/audio/transcriptions` endpoint
/// (whisper.cpp server, faster-whisper-server, OpenAI).
pub struct WhisperRecognizer {
    client: Client,
    config: SpeechConfig,
}

#[derive(Deserialize)]
struct TranscriptionResponse {
    #[serde(default)]
    text: String,
}

impl WhisperRecognizer {
    pub fn new(config: &SpeechConfig) -> Result<Self, SpeechError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| SpeechError::Other(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            config: config.clone(),
        })
    }
}

#[async_trait]
impl SpeechRecognizer for WhisperRecognizer {
    async fn transcribe(&self, audio: &Path) -> Result<String, SpeechError> {
        let data = tokio::fs::read(audio).await?;

        let part = multipart::Part::bytes(data)
            .file_name("audio.wav")
            .mime_str("audio/wav")
            .map_err(|e| SpeechError::Other(e.to_string()))?;

        let mut form = multipart::Form::new()
            .text("model", self.config.model.clone())
            .part("file", part);
        if let Some(language) = &self.config.language {
            form = form.text("language", language.clone());
        }

        let mut request = self.client.post(&self.config.endpoint).multipart(form);
        if let Some(api_key) = &self.config.api_key {
            request = request.bearer_auth(api_key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| SpeechError::Request(e.to_string()))?;

        let status = response.status();
        if status.is_server_error() {
            return Err(SpeechError::Request(format!("HTTP {}", status)));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SpeechError::Other(format!("HTTP {} - {}", status, body)));
        }

        let transcription: TranscriptionResponse = response
            .json()
            .await
            .map_err(|e| SpeechError::Other(format!("unreadable transcription: {}", e)))?;

        let text = transcription.text.trim();
        if text.is_empty() {
            return Err(SpeechError::UnknownValue);
        }

        Ok(text.to_string())
    }

    fn name(&self) -> &str {
        "whisper"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fallback_texts_are_distinct() {
        assert_eq!(
            SpeechError::Request("connection refused".into()).fallback_text(),
            "Speech recognition failed (network issue): connection refused"
        );
        assert_eq!(SpeechError::UnknownValue.fallback_text(), UNINTELLIGIBLE_AUDIO);
        assert_eq!(
            SpeechError::Other("HTTP 400 - bad file".into()).fallback_text(),
            "Speech recognition failed: HTTP 400 - bad file"
        );
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_network_issue() {
        let dir = tempfile::tempdir().unwrap();
        let audio = dir.path().join("audio.wav");
        std::fs::write(&audio, b"RIFF").unwrap();

        let recognizer = WhisperRecognizer::new(&SpeechConfig {
            endpoint: "http://127.0.0.1:9/v1/audio/transcriptions".to_string(),
            timeout_secs: 2,
            ..SpeechConfig::default()
        })
        .unwrap();

        let err = recognizer.transcribe(&audio).await.unwrap_err();
        assert!(matches!(err, SpeechError::Request(_)));
    }

    #[tokio::test]
    async fn test_missing_file_is_io_error() {
        let recognizer = WhisperRecognizer::new(&SpeechConfig::default()).unwrap();
        let err = recognizer
            .transcribe(Path::new("/nonexistent/audio.wav"))
            .await
            .unwrap_err();
        assert!(matches!(err, SpeechError::Io(_)));
    }
}
