//! In-process fakes for the external collaborators

use async_trait::async_trait;
use parking_lot::Mutex;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::ingestion::media::{MediaInfo, MediaToolkit};
use crate::ingestion::speech::{SpeechError, SpeechRecognizer};
use crate::providers::{LlmProvider, TextStream, VisionProvider};
use crate::types::PromptPayload;

enum LlmBehavior {
    Reply(Vec<String>),
    Unreachable,
    FailAfter(Vec<String>),
}

/// Generative backend that replays canned fragments and records payloads
pub struct FakeLlm {
    behavior: LlmBehavior,
    payloads: Mutex<Vec<PromptPayload>>,
}

impl FakeLlm {
    fn with(behavior: LlmBehavior) -> Self {
        Self {
            behavior,
            payloads: Mutex::new(Vec::new()),
        }
    }

    pub fn replying(fragments: &[&str]) -> Self {
        Self::with(LlmBehavior::Reply(owned(fragments)))
    }

    pub fn unreachable() -> Self {
        Self::with(LlmBehavior::Unreachable)
    }

    pub fn failing_after(fragments: &[&str]) -> Self {
        Self::with(LlmBehavior::FailAfter(owned(fragments)))
    }

    pub fn payloads(&self) -> Vec<PromptPayload> {
        self.payloads.lock().clone()
    }
}

fn owned(fragments: &[&str]) -> Vec<String> {
    fragments.iter().map(|s| s.to_string()).collect()
}

#[async_trait]
impl LlmProvider for FakeLlm {
    async fn generate_stream(&self, payload: PromptPayload) -> Result<TextStream> {
        self.payloads.lock().push(payload);

        let items: Vec<Result<String>> = match &self.behavior {
            LlmBehavior::Reply(fragments) => fragments.iter().cloned().map(Ok).collect(),
            LlmBehavior::Unreachable => {
                return Err(Error::llm("Stream request failed: connection refused"))
            }
            LlmBehavior::FailAfter(fragments) => fragments
                .iter()
                .cloned()
                .map(Ok)
                .chain(std::iter::once(Err(Error::llm("Stream error: connection reset"))))
                .collect(),
        };

        let stream: TextStream = Box::pin(futures::stream::iter(items));
        Ok(stream)
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(!matches!(self.behavior, LlmBehavior::Unreachable))
    }

    fn name(&self) -> &str {
        "fake"
    }

    fn model(&self) -> &str {
        "fake-model"
    }
}

/// Vision model returning a fixed description, optionally failing one call
pub struct FakeVision {
    description: String,
    fail_on_call: Option<usize>,
    calls: Mutex<usize>,
}

impl FakeVision {
    pub fn describing(description: &str) -> Self {
        Self {
            description: description.to_string(),
            fail_on_call: None,
            calls: Mutex::new(0),
        }
    }

    /// Fail the zero-based `call`th request
    pub fn failing_on_call(call: usize) -> Self {
        Self {
            fail_on_call: Some(call),
            ..Self::describing("a frame")
        }
    }
}

#[async_trait]
impl VisionProvider for FakeVision {
    async fn describe_image(&self, image_base64: String, _prompt: &str) -> Result<String> {
        let call = {
            let mut calls = self.calls.lock();
            let call = *calls;
            *calls += 1;
            call
        };

        if image_base64.is_empty() {
            return Err(Error::llm("empty image"));
        }
        if self.fail_on_call == Some(call) {
            return Err(Error::llm("Description request failed: timed out"));
        }
        Ok(self.description.clone())
    }

    fn model(&self) -> &str {
        "fake-vision"
    }
}

enum SpeechBehavior {
    Transcript(String),
    Unreachable,
    Unintelligible,
}

/// Speech recognizer with a fixed outcome
pub struct FakeSpeech {
    behavior: SpeechBehavior,
}

impl FakeSpeech {
    pub fn transcript(text: &str) -> Self {
        Self {
            behavior: SpeechBehavior::Transcript(text.to_string()),
        }
    }

    pub fn unreachable() -> Self {
        Self {
            behavior: SpeechBehavior::Unreachable,
        }
    }

    pub fn unintelligible() -> Self {
        Self {
            behavior: SpeechBehavior::Unintelligible,
        }
    }
}

#[async_trait]
impl SpeechRecognizer for FakeSpeech {
    async fn transcribe(&self, audio: &Path) -> std::result::Result<String, SpeechError> {
        if !audio.exists() {
            return Err(SpeechError::Other("audio file missing".to_string()));
        }
        match &self.behavior {
            SpeechBehavior::Transcript(text) => Ok(text.clone()),
            SpeechBehavior::Unreachable => {
                Err(SpeechError::Request("connection refused".to_string()))
            }
            SpeechBehavior::Unintelligible => Err(SpeechError::UnknownValue),
        }
    }

    fn name(&self) -> &str {
        "fake"
    }
}

/// Media toolkit that writes placeholder artifacts and remembers every path it saw
pub struct FakeToolkit {
    info: Option<MediaInfo>,
    touched: Mutex<Vec<PathBuf>>,
}

impl FakeToolkit {
    pub fn new(info: MediaInfo) -> Self {
        Self {
            info: Some(info),
            touched: Mutex::new(Vec::new()),
        }
    }

    /// Probing fails as for a corrupt container
    pub fn unreadable() -> Self {
        Self {
            info: None,
            touched: Mutex::new(Vec::new()),
        }
    }

    /// Video, audio and frame paths handed to the toolkit, in call order
    pub fn touched_paths(&self) -> Vec<PathBuf> {
        self.touched.lock().clone()
    }

    fn touch(&self, path: &Path) {
        self.touched.lock().push(path.to_path_buf());
    }
}

#[async_trait]
impl MediaToolkit for FakeToolkit {
    async fn probe(&self, video: &Path) -> Result<MediaInfo> {
        self.touch(video);
        self.info
            .clone()
            .ok_or_else(|| Error::media("moov atom not found"))
    }

    async fn extract_audio(&self, _video: &Path, output: &Path) -> Result<()> {
        self.touch(output);
        tokio::fs::write(output, b"RIFF....WAVE").await?;
        Ok(())
    }

    async fn save_frame(&self, _video: &Path, _timestamp_secs: f64, output: &Path) -> Result<()> {
        self.touch(output);
        tokio::fs::write(output, [0xFF, 0xD8, 0xFF, 0xE0]).await?;
        Ok(())
    }
}
