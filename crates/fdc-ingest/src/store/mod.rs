//! Storage contract consumed by the ingest core
//!
//! The connection and authentication lifecycle of a real document store lives
//! outside this crate; loaders only see the four operations below. Any
//! deadline or retry policy belongs to the implementation, not the loaders.
//!
//! Implementations must be safe for concurrent use by every loader task of a
//! run.

pub mod memory;

use async_trait::async_trait;
use fdc_common::types::{DictionaryRecord, DictionaryTable, Document, Food, NutrientFact};
use thiserror::Error;

pub use memory::MemoryStore;

/// Errors reported by a [`DocumentStore`]. A missing document is not an error.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Document {0} is not a food")]
    UnexpectedDocument(String),

    #[error("Bulk write rejected: {0}")]
    BulkRejected(String),
}

/// Document store operations used by the loaders
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Fetch a food by store id; `Ok(None)` when absent
    async fn get(&self, id: &str) -> Result<Option<Food>, StoreError>;

    /// Idempotent upsert: the stored document is replaced by `doc`
    async fn update(&self, id: &str, doc: Document) -> Result<(), StoreError>;

    /// Best-effort batch write of fact documents, keyed by their `id`.
    /// No partial-success reporting.
    async fn bulk_write(&self, facts: Vec<NutrientFact>) -> Result<(), StoreError>;

    /// One page of a dictionary table, ordered by code
    async fn get_dictionary(
        &self,
        namespace: &str,
        table: DictionaryTable,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<DictionaryRecord>, StoreError>;
}
