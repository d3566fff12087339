//! Extractor set: one text extractor per supported upload format

use base64::{engine::general_purpose::STANDARD, Engine};
use bytes::Bytes;
use calamine::Reader;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::types::{ExtractedContent, FileType};

use super::video::VideoDecomposer;

/// Routes an upload to the extractor for its extension
#[derive(Clone)]
pub struct FileParser {
    video: Arc<VideoDecomposer>,
}

impl FileParser {
    pub fn new(video: Arc<VideoDecomposer>) -> Self {
        Self { video }
    }

    /// Extract content from an upload.
    ///
    /// Never fails: an extraction error becomes `ExtractedContent::Failed`
    /// carrying the one-line diagnostic that stands in for the content.
    /// Document parsing runs on the blocking pool.
    pub async fn extract(&self, filename: &str, data: Bytes) -> ExtractedContent {
        let file_type = FileType::from_filename(filename);

        tracing::info!(
            "Extracting {} ({} bytes) as {:?}",
            filename,
            data.len(),
            file_type
        );

        let parse: fn(&str, &[u8]) -> Result<String> = match file_type {
            FileType::Image => {
                return ExtractedContent::Image {
                    base64: STANDARD.encode(&data),
                }
            }
            FileType::Video => {
                return match self.video.decompose(data).await {
                    Ok(summary) => ExtractedContent::Video(summary),
                    Err(e) => failed(filename, file_type, e),
                };
            }
            FileType::Unknown => {
                return ExtractedContent::Unsupported {
                    filename: filename.to_string(),
                }
            }
            FileType::Pdf => parse_pdf,
            FileType::Docx => parse_docx,
            FileType::Csv => parse_csv,
            FileType::Xlsx => parse_xlsx,
        };

        let name = filename.to_string();
        let parsed = tokio::task::spawn_blocking(move || parse(&name, &data))
            .await
            .unwrap_or_else(|e| Err(Error::internal(format!("extractor task failed: {}", e))));

        match parsed {
            Ok(text) => ExtractedContent::Text { file_type, text },
            Err(e) => failed(filename, file_type, e),
        }
    }
}

fn failed(filename: &str, file_type: FileType, error: Error) -> ExtractedContent {
    tracing::warn!("Extraction of {} failed: {}", filename, error);
    ExtractedContent::Failed {
        file_type,
        diagnostic: error.diagnostic(),
    }
}

/// Parse PDF document
fn parse_pdf(filename: &str, data: &[u8]) -> Result<String> {
    // pdf-extract panics on some malformed inputs
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
        pdf_extract::extract_text_from_mem(data)
    }));

    match outcome {
        Ok(Ok(text)) => Ok(text),
        Ok(Err(e)) => Err(Error::file_parse(filename, e.to_string())),
        Err(_) => Err(Error::file_parse(filename, "malformed PDF")),
    }
}

/// Parse DOCX document, one line per paragraph
fn parse_docx(filename: &str, data: &[u8]) -> Result<String> {
    let doc = docx_rs::read_docx(data).map_err(|e| Error::file_parse(filename, e.to_string()))?;

    let mut content = String::new();
    for child in doc.document.children {
        if let docx_rs::DocumentChild::Paragraph(p) = child {
            for child in p.children {
                if let docx_rs::ParagraphChild::Run(run) = child {
                    for child in run.children {
                        if let docx_rs::RunChild::Text(t) = child {
                            content.push_str(&t.text);
                        }
                    }
                }
            }
            content.push('\n');
        }
    }

    Ok(content)
}

/// Parse CSV file; ragged rows are kept and invalid UTF-8 is replaced
fn parse_csv(filename: &str, data: &[u8]) -> Result<String> {
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(data);
    let mut content = String::new();

    let headers = reader
        .byte_headers()
        .map_err(|e| Error::file_parse(filename, e.to_string()))?;
    push_csv_row(&mut content, headers);

    for record in reader.byte_records() {
        let record = record.map_err(|e| Error::file_parse(filename, e.to_string()))?;
        push_csv_row(&mut content, &record);
    }

    Ok(content)
}

fn push_csv_row(content: &mut String, record: &csv::ByteRecord) {
    let fields: Vec<_> = record.iter().map(String::from_utf8_lossy).collect();
    content.push_str(&fields.join(" | "));
    content.push('\n');
}

/// Parse Excel spreadsheet, every sheet in workbook order
fn parse_xlsx(filename: &str, data: &[u8]) -> Result<String> {
    let cursor = std::io::Cursor::new(data);
    let mut workbook = calamine::open_workbook_auto_from_rs(cursor)
        .map_err(|e| Error::file_parse(filename, e.to_string()))?;

    let mut content = String::new();
    for sheet_name in workbook.sheet_names().to_vec() {
        let Ok(range) = workbook.worksheet_range(&sheet_name) else {
            continue;
        };

        content.push_str(&format!("Sheet: {}\n", sheet_name));
        for row in range.rows() {
            let cells: Vec<String> = row
                .iter()
                .map(|cell| match cell {
                    calamine::Data::Empty => String::new(),
                    calamine::Data::String(s) => s.clone(),
                    calamine::Data::Float(f) => f.to_string(),
                    calamine::Data::Int(i) => i.to_string(),
                    calamine::Data::Bool(b) => b.to_string(),
                    calamine::Data::DateTime(dt) => dt.to_string(),
                    _ => String::new(),
                })
                .collect();

            if !cells.iter().all(|s| s.is_empty()) {
                content.push_str(&cells.join(" | "));
                content.push('\n');
            }
        }
        content.push('\n');
    }

    Ok(content)
}
