//! Ingest configuration
//!
//! Loaded from the environment (a `.env` file is honoured) and overridden per
//! invocation by CLI flags.

use serde::{Deserialize, Serialize};

use crate::error::IngestError;

/// Default dictionary namespace (bucket) in the document store.
pub const DEFAULT_NAMESPACE: &str = "gnutdata";

/// Default number of fact documents per bulk write.
pub const DEFAULT_FACT_BATCH_SIZE: usize = 1000;

/// Default page size for dictionary fetches. Dictionaries are expected to fit
/// in one page.
pub const DEFAULT_DICTIONARY_PAGE_LIMIT: usize = 500;

/// Default number of rows between progress log lines.
pub const DEFAULT_PROGRESS_INTERVAL: u64 = 1000;

/// Ingest run configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestConfig {
    /// Namespace dictionaries are fetched from
    pub namespace: String,
    /// Prefix entity ids with the dataset type (`SR:45001000`) so several
    /// datasets can share one store
    pub namespace_ids: bool,
    /// Fact documents buffered before a bulk write
    pub fact_batch_size: usize,
    /// Rows fetched per dictionary table
    pub dictionary_page_limit: usize,
    /// Rows between progress log lines
    pub progress_interval: u64,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            namespace: DEFAULT_NAMESPACE.to_string(),
            namespace_ids: false,
            fact_batch_size: DEFAULT_FACT_BATCH_SIZE,
            dictionary_page_limit: DEFAULT_DICTIONARY_PAGE_LIMIT,
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
        }
    }
}

impl IngestConfig {
    /// Load from environment variables
    ///
    /// - `FDC_NAMESPACE`
    /// - `FDC_NAMESPACE_IDS` (true/false)
    /// - `FDC_FACT_BATCH_SIZE`
    /// - `FDC_DICTIONARY_PAGE_LIMIT`
    /// - `FDC_PROGRESS_INTERVAL`
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let config = Self {
            namespace: std::env::var("FDC_NAMESPACE")
                .unwrap_or_else(|_| DEFAULT_NAMESPACE.to_string()),
            namespace_ids: std::env::var("FDC_NAMESPACE_IDS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(false),
            fact_batch_size: std::env::var("FDC_FACT_BATCH_SIZE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_FACT_BATCH_SIZE),
            dictionary_page_limit: std::env::var("FDC_DICTIONARY_PAGE_LIMIT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_DICTIONARY_PAGE_LIMIT),
            progress_interval: std::env::var("FDC_PROGRESS_INTERVAL")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_PROGRESS_INTERVAL),
        };

        config.validate()?;
        Ok(config)
    }

    /// Progress interval usable as a divisor; zero logs every row
    pub fn progress_every(&self) -> u64 {
        self.progress_interval.max(1)
    }

    pub fn validate(&self) -> Result<(), IngestError> {
        if self.namespace.trim().is_empty() {
            return Err(IngestError::Config("namespace must not be empty".to_string()));
        }
        if self.fact_batch_size == 0 {
            return Err(IngestError::Config("fact_batch_size must be at least 1".to_string()));
        }
        if self.dictionary_page_limit == 0 {
            return Err(IngestError::Config(
                "dictionary_page_limit must be at least 1".to_string(),
            ));
        }
        if self.progress_interval == 0 {
            return Err(IngestError::Config(
                "progress_interval must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
