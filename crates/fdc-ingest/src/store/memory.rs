//! In-memory [`DocumentStore`] used by the CLI export path and the tests.
//!
//! Documents and facts live in `BTreeMap`s behind `std::sync::RwLock`, so
//! exports come out ordered by id. The namespace argument of dictionary
//! fetches is ignored: one store holds one namespace.

use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use fdc_common::types::{DictionaryRecord, DictionaryTable, Document, Food, NutrientFact};
use serde::Serialize;

use super::{DocumentStore, StoreError};

/// In-memory document store
#[derive(Default)]
pub struct MemoryStore {
    docs: RwLock<BTreeMap<String, Document>>,
    facts: RwLock<BTreeMap<String, NutrientFact>>,
}

/// Serializable copy of the whole store
#[derive(Debug, Serialize)]
pub struct StoreExport {
    pub documents: BTreeMap<String, Document>,
    pub facts: BTreeMap<String, NutrientFact>,
}

// A poisoned lock only means another task panicked mid-write of a single
// map entry; the map itself is still consistent.
fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(|e| e.into_inner())
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(|e| e.into_inner())
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Food stored under `id`, if any
    pub fn food(&self, id: &str) -> Option<Food> {
        match read(&self.docs).get(id) {
            Some(Document::Food(food)) => Some(food.as_ref().clone()),
            _ => None,
        }
    }

    pub fn fact(&self, id: &str) -> Option<NutrientFact> {
        read(&self.facts).get(id).cloned()
    }

    /// All facts whose parent is `entity_id`, ordered by fact id
    pub fn facts_for(&self, entity_id: &str) -> Vec<NutrientFact> {
        read(&self.facts)
            .values()
            .filter(|f| f.fdc_id == entity_id)
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        read(&self.docs).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn fact_count(&self) -> usize {
        read(&self.facts).len()
    }

    pub fn export(&self) -> StoreExport {
        StoreExport {
            documents: read(&self.docs).clone(),
            facts: read(&self.facts).clone(),
        }
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn get(&self, id: &str) -> Result<Option<Food>, StoreError> {
        match read(&self.docs).get(id) {
            None => Ok(None),
            Some(Document::Food(food)) => Ok(Some(food.as_ref().clone())),
            Some(Document::Dictionary(_)) => Err(StoreError::UnexpectedDocument(id.to_string())),
        }
    }

    async fn update(&self, id: &str, doc: Document) -> Result<(), StoreError> {
        write(&self.docs).insert(id.to_string(), doc);
        Ok(())
    }

    async fn bulk_write(&self, facts: Vec<NutrientFact>) -> Result<(), StoreError> {
        let mut stored = write(&self.facts);
        for fact in facts {
            stored.insert(fact.id.clone(), fact);
        }
        Ok(())
    }

    async fn get_dictionary(
        &self,
        _namespace: &str,
        table: DictionaryTable,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<DictionaryRecord>, StoreError> {
        let docs = read(&self.docs);
        let mut records: Vec<DictionaryRecord> = docs
            .values()
            .filter_map(|doc| match doc {
                Document::Dictionary(record) if record.table() == table => Some(record.clone()),
                _ => None,
            })
            .collect();
        records.sort_by_key(|r| r.code());
        Ok(records.into_iter().skip(offset).take(limit).collect())
    }
}
