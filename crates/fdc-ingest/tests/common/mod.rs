//! Shared fixtures for the ingest integration tests

#![allow(dead_code, clippy::unwrap_used, clippy::expect_used)]

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use fdc_common::types::{
    Derivation, DictionaryRecord, DictionaryTable, Document, Food, FoodGroup, NutrientFact,
    NutrientInfo,
};
use fdc_ingest::{DocumentStore, MemoryStore, StoreError};
use tempfile::TempDir;

/// Dataset directory with the given files written into it
pub fn dataset_dir(files: &[(&str, &str)]) -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    for (name, body) in files {
        write_file(dir.path(), name, body);
    }
    dir
}

pub fn write_file(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, body).unwrap();
    path
}

/// `food.csv` rows: id, data type, description, category, publication date
pub fn food_rows(ids: impl IntoIterator<Item = u32>) -> String {
    ids.into_iter()
        .map(|id| format!("{id},sr_legacy_food,Food {id},,2019-04-01\n"))
        .collect()
}

/// `food_nutrient.csv` rows for one parent, one per nutrient code
pub fn nutrient_rows(fdc_id: u32, codes: impl IntoIterator<Item = u32>) -> String {
    codes
        .into_iter()
        .enumerate()
        .map(|(i, code)| format!("{},{fdc_id},{code},1.5,,,,\n", i + 1))
        .collect()
}

pub async fn seed_dictionaries(store: &dyn DocumentStore) {
    let records = [
        DictionaryRecord::Nutrient(NutrientInfo {
            nutrient_id: 203,
            nutrient_no: 203,
            name: "Protein".to_string(),
            unit: "g".to_string(),
        }),
        DictionaryRecord::Nutrient(NutrientInfo {
            nutrient_id: 204,
            nutrient_no: 204,
            name: "Total lipid (fat)".to_string(),
            unit: "g".to_string(),
        }),
        DictionaryRecord::Derivation(Derivation {
            id: 71,
            code: "LCCS".to_string(),
            description: "Calculated from value per serving size measure".to_string(),
        }),
        DictionaryRecord::SrFoodGroup(FoodGroup {
            id: 18,
            code: "1800".to_string(),
            description: "Baked Products".to_string(),
            last_update: "2019-04-01".to_string(),
            group_type: "FGSR".to_string(),
        }),
        DictionaryRecord::SurveyFoodGroup(FoodGroup {
            id: 4202,
            description: "Yeast breads".to_string(),
            group_type: "FGFNDDS".to_string(),
            ..Default::default()
        }),
    ];
    for record in records {
        store
            .update(&record.document_id(), record.into())
            .await
            .unwrap();
    }
}

/// Records the size of every bulk write; optionally rejects some of them
#[derive(Default)]
pub struct RecordingStore {
    pub inner: MemoryStore,
    pub bulk_sizes: Mutex<Vec<usize>>,
    /// 1-based bulk write calls that fail
    pub reject_calls: Vec<usize>,
}

impl RecordingStore {
    pub fn rejecting(calls: &[usize]) -> Self {
        Self {
            reject_calls: calls.to_vec(),
            ..Default::default()
        }
    }

    pub fn sizes(&self) -> Vec<usize> {
        self.bulk_sizes.lock().unwrap().clone()
    }
}

#[async_trait]
impl DocumentStore for RecordingStore {
    async fn get(&self, id: &str) -> Result<Option<Food>, StoreError> {
        self.inner.get(id).await
    }

    async fn update(&self, id: &str, doc: Document) -> Result<(), StoreError> {
        self.inner.update(id, doc).await
    }

    async fn bulk_write(&self, facts: Vec<NutrientFact>) -> Result<(), StoreError> {
        let call = {
            let mut sizes = self.bulk_sizes.lock().unwrap();
            sizes.push(facts.len());
            sizes.len()
        };
        if self.reject_calls.contains(&call) {
            return Err(StoreError::BulkRejected(format!("call {call}")));
        }
        self.inner.bulk_write(facts).await
    }

    async fn get_dictionary(
        &self,
        namespace: &str,
        table: DictionaryTable,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<DictionaryRecord>, StoreError> {
        self.inner.get_dictionary(namespace, table, offset, limit).await
    }
}

/// Sleeps between fetch and return so concurrent flushes interleave
#[derive(Default)]
pub struct SlowStore {
    pub inner: MemoryStore,
}

#[async_trait]
impl DocumentStore for SlowStore {
    async fn get(&self, id: &str) -> Result<Option<Food>, StoreError> {
        let food = self.inner.get(id).await;
        tokio::time::sleep(Duration::from_millis(1)).await;
        food
    }

    async fn update(&self, id: &str, doc: Document) -> Result<(), StoreError> {
        tokio::task::yield_now().await;
        self.inner.update(id, doc).await
    }

    async fn bulk_write(&self, facts: Vec<NutrientFact>) -> Result<(), StoreError> {
        self.inner.bulk_write(facts).await
    }

    async fn get_dictionary(
        &self,
        namespace: &str,
        table: DictionaryTable,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<DictionaryRecord>, StoreError> {
        self.inner.get_dictionary(namespace, table, offset, limit).await
    }
}

/// Fails every dictionary fetch
#[derive(Default)]
pub struct NoDictionaryStore {
    pub inner: MemoryStore,
}

#[async_trait]
impl DocumentStore for NoDictionaryStore {
    async fn get(&self, id: &str) -> Result<Option<Food>, StoreError> {
        self.inner.get(id).await
    }

    async fn update(&self, id: &str, doc: Document) -> Result<(), StoreError> {
        self.inner.update(id, doc).await
    }

    async fn bulk_write(&self, facts: Vec<NutrientFact>) -> Result<(), StoreError> {
        self.inner.bulk_write(facts).await
    }

    async fn get_dictionary(
        &self,
        _namespace: &str,
        _table: DictionaryTable,
        _offset: usize,
        _limit: usize,
    ) -> Result<Vec<DictionaryRecord>, StoreError> {
        Err(StoreError::Unavailable("bucket not found".to_string()))
    }
}

/// Rejects writes to one food once it has been written `allowed` times
pub struct FailingUpdateStore {
    pub inner: MemoryStore,
    id: String,
    allowed: usize,
    writes: AtomicUsize,
}

impl FailingUpdateStore {
    pub fn new(id: &str, allowed: usize) -> Self {
        Self {
            inner: MemoryStore::new(),
            id: id.to_string(),
            allowed,
            writes: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl DocumentStore for FailingUpdateStore {
    async fn get(&self, id: &str) -> Result<Option<Food>, StoreError> {
        self.inner.get(id).await
    }

    async fn update(&self, id: &str, doc: Document) -> Result<(), StoreError> {
        if id == self.id && self.writes.fetch_add(1, Ordering::SeqCst) >= self.allowed {
            return Err(StoreError::Unavailable(format!("write to {id} timed out")));
        }
        self.inner.update(id, doc).await
    }

    async fn bulk_write(&self, facts: Vec<NutrientFact>) -> Result<(), StoreError> {
        self.inner.bulk_write(facts).await
    }

    async fn get_dictionary(
        &self,
        namespace: &str,
        table: DictionaryTable,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<DictionaryRecord>, StoreError> {
        self.inner.get_dictionary(namespace, table, offset, limit).await
    }
}
