//! Media toolkit: container probing, audio extraction and frame rendering

use async_trait::async_trait;
use serde::Deserialize;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

use crate::config::VideoConfig;
use crate::error::{Error, Result};

/// What the decomposer needs to know about a container
#[derive(Debug, Clone, PartialEq)]
pub struct MediaInfo {
    /// Clip duration in seconds (0.0 when the container does not report one)
    pub duration_secs: f64,
    /// Whether an audio track exists
    pub has_audio: bool,
}

/// Operations the video decomposer performs on a persisted video
#[async_trait]
pub trait MediaToolkit: Send + Sync {
    /// Open the container and read its duration and track layout
    async fn probe(&self, video: &Path) -> Result<MediaInfo>;

    /// Write the audio track to `output` as 16 kHz mono WAV
    async fn extract_audio(&self, video: &Path, output: &Path) -> Result<()>;

    /// Render the frame at `timestamp_secs` to `output` as JPEG
    async fn save_frame(&self, video: &Path, timestamp_secs: f64, output: &Path) -> Result<()>;
}

/// ffprobe/ffmpeg subprocess implementation
pub struct FfmpegToolkit {
    ffmpeg: PathBuf,
    ffprobe: PathBuf,
    timeout: Duration,
}

impl FfmpegToolkit {
    pub fn new(config: &VideoConfig) -> Self {
        Self {
            ffmpeg: config.ffmpeg_path.clone(),
            ffprobe: config.ffprobe_path.clone(),
            timeout: Duration::from_secs(config.command_timeout_secs),
        }
    }

    /// Run a command to completion under the configured timeout, returning stdout
    async fn run(&self, mut command: Command, program: &Path) -> Result<Vec<u8>> {
        command
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let output = tokio::time::timeout(self.timeout, command.output())
            .await
            .map_err(|_| {
                Error::media(format!(
                    "{} timed out after {:?}",
                    program.display(),
                    self.timeout
                ))
            })?
            .map_err(|e| Error::media(format!("failed to run {}: {}", program.display(), e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::media(format!(
                "{} exited with {}: {}",
                program.display(),
                output.status,
                stderr.trim()
            )));
        }

        Ok(output.stdout)
    }

    async fn render_frame(&self, video: &Path, seek: FrameSeek, output: &Path) -> Result<()> {
        let mut command = Command::new(&self.ffmpeg);
        command.args(frame_args(video, seek, output));
        self.run(command, &self.ffmpeg).await?;
        Ok(())
    }
}

#[async_trait]
impl MediaToolkit for FfmpegToolkit {
    async fn probe(&self, video: &Path) -> Result<MediaInfo> {
        let mut command = Command::new(&self.ffprobe);
        command
            .args(["-v", "error"])
            .args(["-show_entries", "format=duration:stream=codec_type"])
            .args(["-of", "json"])
            .arg(video);

        let stdout = self.run(command, &self.ffprobe).await?;
        let info = parse_probe_output(&stdout)?;

        tracing::debug!(
            "Probed {}: {:.2}s, audio: {}",
            video.display(),
            info.duration_secs,
            info.has_audio
        );

        Ok(info)
    }

    async fn extract_audio(&self, video: &Path, output: &Path) -> Result<()> {
        let mut command = Command::new(&self.ffmpeg);
        command
            .args(["-y", "-v", "error", "-i"])
            .arg(video)
            .args(["-vn", "-acodec", "pcm_s16le", "-ar", "16000", "-ac", "1"])
            .arg(output);

        self.run(command, &self.ffmpeg).await?;
        Ok(())
    }

    async fn save_frame(&self, video: &Path, timestamp_secs: f64, output: &Path) -> Result<()> {
        self.render_frame(video, FrameSeek::At(timestamp_secs), output).await?;

        // ffmpeg exits cleanly without writing anything when seeking past the last frame
        if !has_content(output).await {
            tracing::debug!(
                "No frame at {:.3}s in {}, using the last decodable frame",
                timestamp_secs,
                video.display()
            );
            self.render_frame(video, FrameSeek::Tail, output).await?;
        }

        if !has_content(output).await {
            return Err(Error::media(format!(
                "no frame rendered at {:.1} seconds",
                timestamp_secs
            )));
        }

        Ok(())
    }
}

async fn has_content(path: &Path) -> bool {
    tokio::fs::metadata(path)
        .await
        .map(|m| m.len() > 0)
        .unwrap_or(false)
}

/// Where a frame grab starts decoding
#[derive(Debug, Clone, Copy, PartialEq)]
enum FrameSeek {
    /// Input seek to an absolute position, keeping the first frame decoded
    At(f64),
    /// Decode the final second and keep overwriting, leaving the last frame
    Tail,
}

/// ffmpeg arguments rendering one JPEG frame of `video` to `output`
fn frame_args(video: &Path, seek: FrameSeek, output: &Path) -> Vec<OsString> {
    let mut args: Vec<OsString> = vec!["-y".into(), "-v".into(), "error".into()];

    match seek {
        FrameSeek::At(timestamp_secs) => {
            args.push("-ss".into());
            args.push(format!("{:.3}", timestamp_secs).into());
        }
        FrameSeek::Tail => {
            args.push("-sseof".into());
            args.push("-1".into());
        }
    }

    args.push("-i".into());
    args.push(video.into());

    match seek {
        FrameSeek::At(_) => args.extend(["-frames:v", "1"].map(OsString::from)),
        FrameSeek::Tail => args.extend(["-update", "1"].map(OsString::from)),
    }

    args.extend(["-q:v", "2"].map(OsString::from));
    args.push(output.into());
    args
}

#[derive(Deserialize)]
struct ProbeOutput {
    #[serde(default)]
    streams: Vec<ProbeStream>,
    format: Option<ProbeFormat>,
}

#[derive(Deserialize)]
struct ProbeStream {
    codec_type: Option<String>,
}

#[derive(Deserialize)]
struct ProbeFormat {
    duration: Option<String>,
}

/// Parse `ffprobe -of json` output; a container without a video stream is rejected
pub fn parse_probe_output(stdout: &[u8]) -> Result<MediaInfo> {
    let probe: ProbeOutput = serde_json::from_slice(stdout)
        .map_err(|e| Error::media(format!("unreadable ffprobe output: {}", e)))?;

    let has_stream = |kind: &str| {
        probe
            .streams
            .iter()
            .any(|s| s.codec_type.as_deref() == Some(kind))
    };

    if !has_stream("video") {
        return Err(Error::media("no video stream found"));
    }

    let duration_secs = probe
        .format
        .and_then(|f| f.duration)
        .and_then(|d| d.trim().parse::<f64>().ok())
        .filter(|d| d.is_finite())
        .unwrap_or(0.0);

    Ok(MediaInfo {
        duration_secs,
        has_audio: has_stream("audio"),
    })
}
