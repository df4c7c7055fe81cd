//! Error types for the ingest pipeline

use std::path::PathBuf;

use fdc_common::types::DictionaryTable;
use thiserror::Error;

use crate::store::StoreError;

/// Result type alias for ingest operations
pub type Result<T> = std::result::Result<T, IngestError>;

/// Failures that end a loader task or a whole run.
///
/// Per-row parse problems never surface here; they are logged and defaulted
/// where they happen.
#[derive(Error, Debug)]
pub enum IngestError {
    #[error("Cannot open {path}: {source}")]
    FileOpen {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed reading {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: csv_async::Error,
    },

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Failed to load {table} dictionary: {source}")]
    Dictionary {
        table: DictionaryTable,
        #[source]
        source: StoreError,
    },

    #[error("Task {task} panicked: {message}")]
    TaskPanicked { task: String, message: String },

    #[error("Configuration error: {0}")]
    Config(String),
}

impl IngestError {
    /// File and dictionary failures abort their stage; the run result must
    /// reflect them.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            IngestError::FileOpen { .. } | IngestError::Read { .. } | IngestError::Dictionary { .. }
        )
    }
}
