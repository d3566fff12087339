//! Video decomposition into an audio transcript and described frames

use base64::{engine::general_purpose::STANDARD, Engine};
use bytes::Bytes;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use tempfile::NamedTempFile;

use crate::config::VideoConfig;
use crate::error::{Error, Result};
use crate::providers::VisionProvider;
use crate::types::{FrameDescription, VideoSummary};

use super::media::MediaToolkit;
use super::speech::{SpeechError, SpeechRecognizer, NO_AUDIO};

/// Splits a video into its audio track and a sequence of sampled frames,
/// transcribing the former and describing each of the latter.
///
/// Every intermediate artifact is a [`NamedTempFile`] owned by the call that
/// created it, so it is removed when that call returns on any path.
pub struct VideoDecomposer {
    toolkit: Arc<dyn MediaToolkit>,
    speech: Arc<dyn SpeechRecognizer>,
    vision: Arc<dyn VisionProvider>,
    frame_interval_secs: f64,
    max_frames: usize,
    frame_prompt: String,
}

impl VideoDecomposer {
    pub fn new(
        config: &VideoConfig,
        toolkit: Arc<dyn MediaToolkit>,
        speech: Arc<dyn SpeechRecognizer>,
        vision: Arc<dyn VisionProvider>,
    ) -> Self {
        Self {
            toolkit,
            speech,
            vision,
            frame_interval_secs: config.frame_interval_secs,
            max_frames: config.max_frames,
            frame_prompt: config.frame_prompt.clone(),
        }
    }

    /// Decompose raw video bytes.
    ///
    /// Returns `VideoPersist` or `VideoDecode` when the clip cannot be stored or
    /// opened. Audio and per-frame failures degrade to inline text instead.
    pub async fn decompose(&self, data: Bytes) -> Result<VideoSummary> {
        let video = tokio::task::spawn_blocking(move || persist_video(&data))
            .await
            .map_err(|e| Error::internal(format!("video persist task failed: {}", e)))??;

        let info = self
            .toolkit
            .probe(video.path())
            .await
            .map_err(|e| Error::VideoDecode(e.to_string()))?;

        tracing::info!(
            "Decomposing video: {:.2}s, audio track: {}, frames described by {}",
            info.duration_secs,
            info.has_audio,
            self.vision.model()
        );

        let audio = if info.has_audio {
            self.transcribe_audio(video.path()).await
        } else {
            NO_AUDIO.to_string()
        };

        let timestamps =
            sample_timestamps(info.duration_secs, self.frame_interval_secs, self.max_frames);
        let last = timestamps.len().saturating_sub(1);

        // Sequential so frame labels keep timestamp order
        let mut frames = Vec::with_capacity(timestamps.len());
        for (i, timestamp) in timestamps.into_iter().enumerate() {
            let description = match self.describe_frame(video.path(), timestamp).await {
                Ok(description) => description,
                Err(e) => {
                    tracing::warn!("Frame at {:.1}s failed: {}", timestamp, e);
                    format!("Error processing frame: {}", e)
                }
            };

            frames.push(FrameDescription {
                timestamp_secs: timestamp,
                description,
                is_final_frame: i == last,
            });
        }

        Ok(VideoSummary { audio, frames })
    }

    /// Transcript of the audio track, or the fallback text for why there is none
    async fn transcribe_audio(&self, video: &Path) -> String {
        match self.extract_and_transcribe(video).await {
            Ok(transcript) => transcript,
            Err(e) => {
                tracing::warn!("Transcription via {} failed: {}", self.speech.name(), e);
                e.fallback_text()
            }
        }
    }

    async fn extract_and_transcribe(
        &self,
        video: &Path,
    ) -> std::result::Result<String, SpeechError> {
        let audio = temp_artifact(".wav")?;
        self.toolkit
            .extract_audio(video, audio.path())
            .await
            .map_err(|e| SpeechError::Other(e.to_string()))?;
        self.speech.transcribe(audio.path()).await
    }

    async fn describe_frame(&self, video: &Path, timestamp: f64) -> Result<String> {
        let frame = temp_artifact(".jpg")?;
        self.toolkit.save_frame(video, timestamp, frame.path()).await?;

        let bytes = tokio::fs::read(frame.path()).await?;
        let encoded = STANDARD.encode(bytes);

        self.vision
            .describe_image(encoded, &self.frame_prompt)
            .await
    }
}

fn temp_artifact(suffix: &str) -> std::io::Result<NamedTempFile> {
    tempfile::Builder::new()
        .prefix("media-rag-")
        .suffix(suffix)
        .tempfile()
}

fn persist_video(data: &[u8]) -> Result<NamedTempFile> {
    let written = temp_artifact(".mp4").and_then(|mut file| {
        file.write_all(data)?;
        file.flush()?;
        Ok(file)
    });

    match written {
        Ok(file) if !data.is_empty() => Ok(file),
        Ok(_) => Err(Error::VideoPersist),
        Err(e) => {
            tracing::error!("Failed to persist uploaded video: {}", e);
            Err(Error::VideoPersist)
        }
    }
}

/// Sample positions from 0 up to and including `duration_secs`.
///
/// Yields `floor(duration / interval) + 1` samples, clamped to the duration.
/// When that exceeds `max_frames` (at least 2), `max_frames` samples are
/// spread evenly from 0 to the duration instead.
/// An empty set (negative duration or unusable interval) becomes a single
/// sample at the midpoint, or 0.0 when the duration is not positive.
pub fn sample_timestamps(duration_secs: f64, interval_secs: f64, max_frames: usize) -> Vec<f64> {
    let mut samples = Vec::new();
    let max_frames = max_frames.max(2);

    if interval_secs > 0.0 && interval_secs.is_finite() && duration_secs.is_finite() {
        let count = (duration_secs / interval_secs).floor() + 1.0;
        if count > max_frames as f64 {
            let last = max_frames - 1;
            samples = (0..max_frames)
                .map(|i| {
                    if i == last {
                        duration_secs
                    } else {
                        duration_secs * i as f64 / last as f64
                    }
                })
                .collect();
        } else if count >= 1.0 {
            samples = (0..count as usize)
                .map(|i| i as f64 * interval_secs)
                .filter(|t| *t <= duration_secs)
                .map(|t| t.min(duration_secs))
                .collect();
        }
    }

    if samples.is_empty() {
        let fallback = if duration_secs > 0.0 && duration_secs.is_finite() {
            duration_secs / 2.0
        } else {
            0.0
        };
        samples.push(fallback);
    }

    samples
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeSpeech, FakeToolkit, FakeVision};
    use crate::ingestion::media::MediaInfo;

    fn decomposer(
        toolkit: Arc<FakeToolkit>,
        speech: FakeSpeech,
        vision: FakeVision,
    ) -> VideoDecomposer {
        VideoDecomposer::new(
            &VideoConfig::default(),
            toolkit,
            Arc::new(speech),
            Arc::new(vision),
        )
    }

    #[test]
    fn test_sample_timestamps_counts() {
        assert_eq!(sample_timestamps(2.3, 0.5, 600), vec![0.0, 0.5, 1.0, 1.5, 2.0]);
        assert_eq!(sample_timestamps(1.0, 0.5, 600), vec![0.0, 0.5, 1.0]);
        assert_eq!(sample_timestamps(0.2, 0.5, 600), vec![0.0]);
    }

    #[test]
    fn test_sample_timestamps_never_empty() {
        assert_eq!(sample_timestamps(0.0, 0.5, 600), vec![0.0]);
        assert_eq!(sample_timestamps(-1.0, 0.5, 600), vec![0.0]);
        assert_eq!(sample_timestamps(4.0, 0.0, 600), vec![2.0]);
        assert_eq!(sample_timestamps(f64::NAN, 0.5, 600), vec![0.0]);
    }

    #[test]
    fn test_sample_timestamps_capped() {
        assert_eq!(sample_timestamps(10.0, 0.5, 5), vec![0.0, 2.5, 5.0, 7.5, 10.0]);

        // a header claiming a century of footage
        let duration = 100.0 * 365.0 * 86_400.0;
        let samples = sample_timestamps(duration, 0.5, 600);
        assert_eq!(samples.len(), 600);
        assert_eq!(samples[0], 0.0);
        assert_eq!(samples[599], duration);
        assert!(samples.windows(2).all(|w| w[0] < w[1]));

        // exactly at the cap keeps the regular interval
        assert_eq!(sample_timestamps(1.0, 0.5, 3), vec![0.0, 0.5, 1.0]);
    }

    #[tokio::test]
    async fn test_decompose_labels_final_frame() {
        let toolkit = Arc::new(FakeToolkit::new(MediaInfo {
            duration_secs: 1.0,
            has_audio: true,
        }));
        let decomposer = decomposer(
            toolkit.clone(),
            FakeSpeech::transcript("hello there"),
            FakeVision::describing("a red car"),
        );

        let summary = decomposer.decompose(Bytes::from_static(b"fake mp4 bytes")).await.unwrap();
        assert_eq!(summary.audio, "hello there");
        assert_eq!(summary.frames.len(), 3);
        assert!(summary.frames[..2].iter().all(|f| !f.is_final_frame));
        assert!(summary.frames[2].is_final_frame);
        assert_eq!(summary.frames[2].timestamp_secs, 1.0);
        assert!(summary.render().ends_with(
            "Final Frame at 1.0 seconds (most relevant for identifying the main subject): a red car"
        ));
    }

    #[tokio::test]
    async fn test_decompose_respects_frame_cap() {
        let toolkit = Arc::new(FakeToolkit::new(MediaInfo {
            duration_secs: 10.0,
            has_audio: false,
        }));
        let config = VideoConfig {
            max_frames: 3,
            ..VideoConfig::default()
        };
        let decomposer = VideoDecomposer::new(
            &config,
            toolkit,
            Arc::new(FakeSpeech::transcript("unused")),
            Arc::new(FakeVision::describing("a beach")),
        );

        let summary = decomposer.decompose(Bytes::from_static(b"clip")).await.unwrap();
        let stamps: Vec<f64> = summary.frames.iter().map(|f| f.timestamp_secs).collect();
        assert_eq!(stamps, vec![0.0, 5.0, 10.0]);
        assert!(summary.frames[2].is_final_frame);
    }

    #[tokio::test]
    async fn test_temp_artifacts_removed() {
        let toolkit = Arc::new(FakeToolkit::new(MediaInfo {
            duration_secs: 0.5,
            has_audio: true,
        }));
        let decomposer = decomposer(
            toolkit.clone(),
            FakeSpeech::transcript("hi"),
            FakeVision::describing("scene"),
        );

        decomposer.decompose(Bytes::from_static(b"fake mp4 bytes")).await.unwrap();

        let touched = toolkit.touched_paths();
        // video, audio, two frames
        assert_eq!(touched.len(), 4);
        assert!(touched.iter().all(|p| !p.exists()));
    }

    #[tokio::test]
    async fn test_decode_failure_is_fatal_and_cleans_up() {
        let toolkit = Arc::new(FakeToolkit::unreadable());
        let decomposer = decomposer(
            toolkit.clone(),
            FakeSpeech::transcript("unused"),
            FakeVision::describing("unused"),
        );

        let err = decomposer.decompose(Bytes::from_static(b"not a video")).await.unwrap_err();
        assert!(matches!(err, Error::VideoDecode(_)));
        assert!(err.diagnostic().starts_with("Error: Failed to process video: "));
        assert!(toolkit.touched_paths().iter().all(|p| !p.exists()));
    }

    #[tokio::test]
    async fn test_empty_upload_is_persist_failure() {
        let toolkit = Arc::new(FakeToolkit::new(MediaInfo {
            duration_secs: 1.0,
            has_audio: false,
        }));
        let decomposer = decomposer(
            toolkit,
            FakeSpeech::transcript("unused"),
            FakeVision::describing("unused"),
        );

        let err = decomposer.decompose(Bytes::from_static(b"")).await.unwrap_err();
        assert_eq!(err.diagnostic(), "Error: Failed to save the video file.");
    }

    #[tokio::test]
    async fn test_audio_fallbacks() {
        let silent = Arc::new(FakeToolkit::new(MediaInfo {
            duration_secs: 0.0,
            has_audio: false,
        }));
        let summary = decomposer(silent, FakeSpeech::transcript("x"), FakeVision::describing("y"))
            .decompose(Bytes::from_static(b"clip"))
            .await
            .unwrap();
        assert_eq!(summary.audio, NO_AUDIO);
        assert_eq!(summary.frames.len(), 1);
        assert_eq!(summary.frames[0].timestamp_secs, 0.0);
        assert!(summary.frames[0].is_final_frame);

        let info = MediaInfo {
            duration_secs: 0.0,
            has_audio: true,
        };
        let summary = decomposer(
            Arc::new(FakeToolkit::new(info.clone())),
            FakeSpeech::unreachable(),
            FakeVision::describing("y"),
        )
        .decompose(Bytes::from_static(b"clip"))
        .await
        .unwrap();
        assert!(summary.audio.starts_with("Speech recognition failed (network issue): "));

        let summary = decomposer(
            Arc::new(FakeToolkit::new(info)),
            FakeSpeech::unintelligible(),
            FakeVision::describing("y"),
        )
        .decompose(Bytes::from_static(b"clip"))
        .await
        .unwrap();
        assert_eq!(summary.audio, "Could not understand the audio.");
    }

    #[tokio::test]
    async fn test_frame_failure_stays_inline() {
        let toolkit = Arc::new(FakeToolkit::new(MediaInfo {
            duration_secs: 1.0,
            has_audio: false,
        }));
        let decomposer = decomposer(
            toolkit,
            FakeSpeech::transcript("unused"),
            FakeVision::failing_on_call(1),
        );

        let summary = decomposer.decompose(Bytes::from_static(b"clip")).await.unwrap();
        assert_eq!(summary.frames.len(), 3);
        assert!(summary.frames[1].description.starts_with("Error processing frame: "));
        assert!(!summary.frames[0].description.starts_with("Error"));
        assert!(!summary.frames[2].description.starts_with("Error"));
        assert!(summary.frames[2].is_final_frame);
    }
}
