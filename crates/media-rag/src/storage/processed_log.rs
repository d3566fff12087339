//! Append-only audit log of extracted upload content

use std::path::{Path, PathBuf};
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use crate::error::Result;

/// Appends one entry per extraction to a plain-text file
pub struct ProcessedLog {
    path: PathBuf,
    // Serializes appends so concurrent entries never interleave
    lock: Mutex<()>,
}

impl ProcessedLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append the extraction result for `filename`
    pub async fn append(&self, filename: &str, content: &str) -> Result<()> {
        let entry = format_entry(filename, content);
        let _guard = self.lock.lock().await;

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(entry.as_bytes()).await?;
        file.flush().await?;

        tracing::debug!("Logged extraction of {} to {}", filename, self.path.display());
        Ok(())
    }
}

fn format_entry(filename: &str, content: &str) -> String {
    format!(
        "--- File: {} ---\nExtracted Content:\n{}\n\n",
        filename, content
    )
}
