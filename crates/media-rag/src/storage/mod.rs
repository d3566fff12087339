//! On-disk persistence

pub mod processed_log;

pub use processed_log::ProcessedLog;
