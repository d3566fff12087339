//! Per-request extraction results

use super::file::FileType;

/// Text shown for an uploaded image in place of extracted content
pub const IMAGE_PLACEHOLDER: &str = "Image uploaded.";

/// Shown when a video yielded no frame descriptions at all
pub const NO_VISUAL_CONTENT: &str = "No visual content extracted.";

/// Result of running one upload through the extractor set.
///
/// Lives for a single request: it is rendered into the processed-data log and,
/// where applicable, folded into the conversation window as a `Bot:` line.
#[derive(Debug, Clone, PartialEq)]
pub enum ExtractedContent {
    /// Plain text pulled out of a document or spreadsheet
    Text { file_type: FileType, text: String },
    /// Image bytes, base64-encoded for the generation payload
    Image { base64: String },
    /// Audio transcript plus per-frame descriptions
    Video(VideoSummary),
    /// Extraction failed before producing anything usable
    Failed { file_type: FileType, diagnostic: String },
    /// Extension not in the supported set
    Unsupported { filename: String },
}

impl ExtractedContent {
    /// Full text form, as written to the processed-data log
    pub fn render(&self) -> String {
        match self {
            Self::Text { text, .. } => text.clone(),
            Self::Image { .. } => IMAGE_PLACEHOLDER.to_string(),
            Self::Video(summary) => summary.render(),
            Self::Failed { diagnostic, .. } => diagnostic.clone(),
            Self::Unsupported { filename } => unsupported_message(filename),
        }
    }

    /// Body of the `Bot:` history line recorded for this upload, if any
    pub fn history_line(&self) -> Option<String> {
        match self {
            Self::Text { file_type, text } => {
                Some(format!("Extracted text from {}:\n{}", file_type.label(), text))
            }
            Self::Video(summary) => Some(format!(
                "Extracted content from video:\nAudio: {}\n{}",
                summary.audio.trim(),
                summary.visual_block()
            )),
            Self::Failed {
                file_type: FileType::Video,
                diagnostic,
            } => Some(format!("Extracted content from video:\n{}", diagnostic)),
            Self::Failed {
                file_type,
                diagnostic,
            } => Some(format!(
                "Extracted text from {}:\n{}",
                file_type.label(),
                diagnostic
            )),
            Self::Image { .. } | Self::Unsupported { .. } => None,
        }
    }

    /// Base64 image to attach to the generation payload
    pub fn image_base64(&self) -> Option<&str> {
        match self {
            Self::Image { base64 } => Some(base64),
            _ => None,
        }
    }
}

/// Caller-visible text for an unrecognized extension
pub fn unsupported_message(filename: &str) -> String {
    format!("Unsupported file format: {}", filename)
}

/// Audio transcript and frame descriptions of one video
#[derive(Debug, Clone, PartialEq)]
pub struct VideoSummary {
    /// Transcript, or the fallback text explaining why there is none
    pub audio: String,
    /// Frame descriptions in timestamp order
    pub frames: Vec<FrameDescription>,
}

impl VideoSummary {
    /// `Audio Content:` line followed by the labelled frame block
    pub fn render(&self) -> String {
        let visual = if self.frames.is_empty() {
            NO_VISUAL_CONTENT.to_string()
        } else {
            self.frames
                .iter()
                .map(FrameDescription::label)
                .collect::<Vec<_>>()
                .join("\n")
        };

        format!("Audio Content: {}\nVisual Content:\n{}", self.audio, visual)
    }

    /// `Visual Content:` header plus one newline-terminated line per frame
    fn visual_block(&self) -> String {
        let mut block = String::from("Visual Content:\n");
        if self.frames.is_empty() {
            block.push_str(NO_VISUAL_CONTENT);
            block.push('\n');
        }
        for frame in &self.frames {
            block.push_str(&frame.label());
            block.push('\n');
        }
        block
    }
}

/// Description of one sampled frame
#[derive(Debug, Clone, PartialEq)]
pub struct FrameDescription {
    /// Sample position in seconds
    pub timestamp_secs: f64,
    /// Model description, or an inline diagnostic if describing failed
    pub description: String,
    /// The chronologically last sample
    pub is_final_frame: bool,
}

impl FrameDescription {
    /// Labelled line; the final frame is flagged for subject identification
    pub fn label(&self) -> String {
        if self.is_final_frame {
            format!(
                "Final Frame at {:.1} seconds (most relevant for identifying the main subject): {}",
                self.timestamp_secs, self.description
            )
        } else {
            format!(
                "Frame at {:.1} seconds: {}",
                self.timestamp_secs, self.description
            )
        }
    }
}
