//! Run-scoped state shared by every loader task

use std::sync::Arc;

use fdc_common::types::DocType;

use crate::config::IngestConfig;
use crate::counts::Counts;
use crate::dictionary::DictionaryCache;
use crate::locks::KeyLocks;
use crate::store::DocumentStore;

/// How raw CSV keys map to store ids
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdScheme {
    doc_type: DocType,
    namespaced: bool,
}

impl IdScheme {
    pub fn new(doc_type: DocType, namespaced: bool) -> Self {
        Self {
            doc_type,
            namespaced,
        }
    }

    pub fn doc_type(&self) -> DocType {
        self.doc_type
    }

    /// `45001000` or, in a shared store, `SR:45001000`
    pub fn entity_id(&self, raw: &str) -> String {
        if self.namespaced {
            format!("{}:{}", self.doc_type, raw)
        } else {
            raw.to_string()
        }
    }
}

/// Everything a loader needs besides its own file.
///
/// Cheap to clone; all members are shared.
#[derive(Clone)]
pub struct IngestContext {
    pub store: Arc<dyn DocumentStore>,
    pub dictionaries: Arc<DictionaryCache>,
    pub counts: Arc<Counts>,
    pub locks: Arc<KeyLocks>,
    pub ids: IdScheme,
    pub config: IngestConfig,
}

impl IngestContext {
    pub fn new(store: Arc<dyn DocumentStore>, doc_type: DocType, config: IngestConfig) -> Self {
        Self {
            store,
            dictionaries: Arc::new(DictionaryCache::new()),
            counts: Arc::new(Counts::new()),
            locks: Arc::new(KeyLocks::new()),
            ids: IdScheme::new(doc_type, config.namespace_ids),
            config,
        }
    }

    pub fn with_dictionaries(mut self, dictionaries: DictionaryCache) -> Self {
        self.dictionaries = Arc::new(dictionaries);
        self
    }
}
