//! Configuration for the media RAG system

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Main system configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RagConfig {
    /// Server configuration
    pub server: ServerConfig,
    /// Ollama/LLM configuration
    pub llm: LlmConfig,
    /// Video decomposition configuration
    pub video: VideoConfig,
    /// Speech-to-text configuration
    pub speech: SpeechConfig,
    /// Knowledge retrieval configuration
    pub retrieval: RetrievalConfig,
    /// Conversation window configuration
    pub conversation: ConversationConfig,
    /// Processed-data log configuration
    pub storage: StorageConfig,
}

impl RagConfig {
    /// Load configuration from a TOML file; missing sections fall back to defaults
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&raw)
    }

    /// Parse configuration from TOML text
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        toml::from_str(raw).map_err(|e| Error::Config(format!("Invalid configuration: {}", e)))
    }
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host address
    pub host: String,
    /// Port number
    pub port: u16,
    /// Enable CORS
    pub enable_cors: bool,
    /// Maximum upload size in bytes (default: 100MB)
    pub max_upload_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            enable_cors: true,
            max_upload_size: 100 * 1024 * 1024, // 100MB
        }
    }
}

/// LLM (Ollama) configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Ollama base URL
    pub base_url: String,
    /// Model used for the streamed chat answer
    pub generate_model: String,
    /// Vision-capable model used to describe video frames
    pub vision_model: String,
    /// Connect timeout in seconds
    pub connect_timeout_secs: u64,
    /// Request timeout for non-streaming calls in seconds
    pub request_timeout_secs: u64,
    /// Retries for frame description requests
    pub max_retries: u32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434".to_string(),
            generate_model: "llava:7b".to_string(),
            vision_model: "llava:7b".to_string(),
            connect_timeout_secs: 10,
            request_timeout_secs: 120,
            max_retries: 0,
        }
    }
}

/// Prompt sent with every sampled video frame
pub const DEFAULT_FRAME_PROMPT: &str = "Describe the content of this image in detail, including the setting, characters, actions, and any text or objects visible.";

/// Video decomposition configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VideoConfig {
    /// Seconds between sampled frames
    pub frame_interval_secs: f64,
    /// Most frames sampled from one clip; longer clips are sampled more sparsely
    pub max_frames: usize,
    /// ffmpeg executable
    pub ffmpeg_path: PathBuf,
    /// ffprobe executable
    pub ffprobe_path: PathBuf,
    /// Upper bound for a single ffmpeg/ffprobe invocation
    pub command_timeout_secs: u64,
    /// Prompt used when describing each frame
    pub frame_prompt: String,
}

impl Default for VideoConfig {
    fn default() -> Self {
        Self {
            frame_interval_secs: 0.5,
            max_frames: 600,
            ffmpeg_path: PathBuf::from("ffmpeg"),
            ffprobe_path: PathBuf::from("ffprobe"),
            command_timeout_secs: 120,
            frame_prompt: DEFAULT_FRAME_PROMPT.to_string(),
        }
    }
}

/// Speech-to-text configuration (OpenAI-compatible transcription endpoint)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeechConfig {
    /// Transcription endpoint URL
    pub endpoint: String,
    /// Model name sent with each request
    pub model: String,
    /// Optional language hint (ISO-639-1)
    pub language: Option<String>,
    /// Optional bearer token
    pub api_key: Option<String>,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:8000/v1/audio/transcriptions".to_string(),
            model: "whisper-1".to_string(),
            language: None,
            api_key: None,
            timeout_secs: 120,
        }
    }
}

/// Knowledge retrieval configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Number of records folded into each prompt
    pub top_k: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self { top_k: 2 }
    }
}

/// Conversation window configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConversationConfig {
    /// Number of history lines kept in the sliding window
    pub history_capacity: usize,
}

impl Default for ConversationConfig {
    fn default() -> Self {
        Self {
            history_capacity: 3,
        }
    }
}

/// Processed-data log configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Append-only audit log of every extraction; `None` disables it
    pub processed_log_path: Option<PathBuf>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            processed_log_path: Some(PathBuf::from("processed_data.txt")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = RagConfig::from_toml_str(
            r#"
            [server]
            port = 9090

            [llm]
            generate_model = "llama3.2-vision"
            "#,
        )
        .unwrap();

        assert_eq!(config.server.port, 9090);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.llm.generate_model, "llama3.2-vision");
        assert_eq!(config.llm.vision_model, "llava:7b");
        assert_eq!(config.video.frame_interval_secs, 0.5);
        assert_eq!(config.video.max_frames, 600);
        assert_eq!(config.retrieval.top_k, 2);
        assert_eq!(config.conversation.history_capacity, 3);
    }

    #[test]
    fn test_invalid_toml_is_config_error() {
        let err = RagConfig::from_toml_str("server = 12").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("media-rag.toml");
        std::fs::write(&path, "[retrieval]\ntop_k = 5\n\n[video]\nmax_frames = 40\n").unwrap();

        let config = RagConfig::from_file(&path).unwrap();
        assert_eq!(config.retrieval.top_k, 5);
        assert_eq!(config.video.max_frames, 40);
        assert!(RagConfig::from_file(dir.path().join("missing.toml")).is_err());
    }
}
