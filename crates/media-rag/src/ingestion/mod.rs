//! Upload ingestion: per-format extraction and video decomposition

pub mod media;
pub mod parser;
pub mod speech;
pub mod video;

pub use media::{FfmpegToolkit, MediaInfo, MediaToolkit};
pub use parser::FileParser;
pub use speech::{SpeechError, SpeechRecognizer, WhisperRecognizer};
pub use video::{sample_timestamps, VideoDecomposer};
