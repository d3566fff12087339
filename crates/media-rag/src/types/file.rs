//! Supported upload formats

use serde::{Deserialize, Serialize};

/// Upload formats the extractor set understands
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    /// JPEG or PNG image, forwarded to the model as-is
    Image,
    /// PDF document
    Pdf,
    /// Microsoft Word document (.docx)
    Docx,
    /// CSV file
    Csv,
    /// Excel spreadsheet (.xlsx)
    Xlsx,
    /// MP4 video
    Video,
    /// Anything else
    Unknown,
}

impl FileType {
    /// Detect file type from extension
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_lowercase().as_str() {
            "jpg" | "jpeg" | "png" => Self::Image,
            "pdf" => Self::Pdf,
            "docx" => Self::Docx,
            "csv" => Self::Csv,
            "xlsx" => Self::Xlsx,
            "mp4" => Self::Video,
            _ => Self::Unknown,
        }
    }

    /// Detect file type from a filename, case-insensitively
    pub fn from_filename(filename: &str) -> Self {
        match filename.rsplit_once('.') {
            Some((_, ext)) => Self::from_extension(ext),
            None => Self::Unknown,
        }
    }

    /// Check if this is a supported file type
    pub fn is_supported(&self) -> bool {
        !matches!(self, Self::Unknown)
    }

    /// Short label used in history lines ("Extracted text from PDF")
    pub fn label(&self) -> &'static str {
        match self {
            Self::Image => "Image",
            Self::Pdf => "PDF",
            Self::Docx => "DOCX",
            Self::Csv => "CSV",
            Self::Xlsx => "XLSX",
            Self::Video => "video",
            Self::Unknown => "Unknown",
        }
    }
}
