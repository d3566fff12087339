//! Application state for the chat server

use parking_lot::RwLock;
use std::sync::Arc;

use crate::config::RagConfig;
use crate::engine::ChatEngine;
use crate::error::{Error, Result};
use crate::ingestion::{FfmpegToolkit, FileParser, VideoDecomposer, WhisperRecognizer};
use crate::providers::{LlmProvider, OllamaProvider};
use crate::retrieval::KeywordRetriever;
use crate::session::SharedSession;
use crate::storage::ProcessedLog;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    /// Configuration
    config: RagConfig,
    /// Turn pipeline and the session it owns
    engine: ChatEngine,
    /// Ready state
    ready: RwLock<bool>,
}

impl AppState {
    /// Wire the Ollama providers, media toolkit, speech recognizer and
    /// processed-data log into a chat engine
    pub async fn new(config: RagConfig) -> Result<Self> {
        tracing::info!("Initializing application state...");

        let (llm, vision) = OllamaProvider::new(&config.llm)?.split();
        tracing::info!(
            "Ollama providers initialized (chat: {}, vision: {})",
            config.llm.generate_model,
            config.llm.vision_model
        );

        let speech = WhisperRecognizer::new(&config.speech)
            .map_err(|e| Error::Config(format!("Speech recognizer: {}", e)))?;
        tracing::info!("Speech recognizer initialized ({})", config.speech.endpoint);

        let toolkit = FfmpegToolkit::new(&config.video);
        let video = VideoDecomposer::new(
            &config.video,
            Arc::new(toolkit),
            Arc::new(speech),
            Arc::new(vision),
        );

        let processed_log = config
            .storage
            .processed_log_path
            .as_ref()
            .map(|path| Arc::new(ProcessedLog::new(path)));
        match &processed_log {
            Some(log) => tracing::info!("Processed-data log: {}", log.path().display()),
            None => tracing::info!("Processed-data log disabled"),
        }

        let engine = ChatEngine::new(
            Arc::new(llm),
            FileParser::new(Arc::new(video)),
            KeywordRetriever::new(config.retrieval.top_k),
            SharedSession::new(config.conversation.history_capacity),
            processed_log,
        );

        let state = Self {
            inner: Arc::new(AppStateInner {
                config,
                engine,
                ready: RwLock::new(false),
            }),
        };

        state.set_ready(true);
        tracing::info!("Application state ready");

        Ok(state)
    }

    /// Get configuration
    pub fn config(&self) -> &RagConfig {
        &self.inner.config
    }

    /// Get the chat engine
    pub fn engine(&self) -> &ChatEngine {
        &self.inner.engine
    }

    /// Get the generation provider
    pub fn llm(&self) -> &Arc<dyn LlmProvider> {
        self.inner.engine.llm()
    }

    /// Check if ready
    pub fn is_ready(&self) -> bool {
        *self.inner.ready.read()
    }

    /// Set ready state
    pub fn set_ready(&self, ready: bool) {
        *self.inner.ready.write() = ready;
    }
}
