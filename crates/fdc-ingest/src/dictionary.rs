//! Reference tables: cached lookups for enrichment, and the CSV loader that
//! puts them in the store.
//!
//! A [`DictionaryCache`] is filled once per run before any row that needs
//! enrichment is read, and is read-only afterwards, so loader tasks share it
//! through an `Arc` without locking.

use std::collections::HashMap;
use std::path::Path;

use fdc_common::types::{
    Derivation, DictionaryRecord, DictionaryTable, FoodGroup, NutrientInfo,
};
use tracing::{info, warn};

use crate::error::{IngestError, Result};
use crate::rows::{CsvRows, Row};
use crate::store::DocumentStore;

/// Code -> record maps for the tables a run needs
#[derive(Debug, Default, Clone)]
pub struct DictionaryCache {
    tables: HashMap<DictionaryTable, HashMap<u32, DictionaryRecord>>,
}

impl DictionaryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch each table as a single page of up to `page_limit` rows.
    ///
    /// A table larger than one page is silently truncated by the store; a
    /// full page is logged as a warning. Any fetch failure is returned as
    /// [`IngestError::Dictionary`].
    pub async fn load(
        store: &dyn DocumentStore,
        namespace: &str,
        tables: &[DictionaryTable],
        page_limit: usize,
    ) -> Result<Self> {
        let mut cache = Self::new();
        for &table in tables {
            let records = store
                .get_dictionary(namespace, table, 0, page_limit)
                .await
                .map_err(|source| IngestError::Dictionary { table, source })?;

            if records.len() >= page_limit {
                warn!(
                    table = %table,
                    page_limit,
                    "Dictionary filled a whole page and may be truncated"
                );
            }
            info!(table = %table, entries = records.len(), "Dictionary loaded");
            cache.insert_all(records);
        }
        Ok(cache)
    }

    /// Add records, each under its own table
    pub fn insert_all(&mut self, records: impl IntoIterator<Item = DictionaryRecord>) {
        for record in records {
            self.tables
                .entry(record.table())
                .or_default()
                .insert(record.code(), record);
        }
    }

    pub fn contains_table(&self, table: DictionaryTable) -> bool {
        self.tables.contains_key(&table)
    }

    /// Raw lookup; absence is not an error
    pub fn lookup(&self, table: DictionaryTable, code: u32) -> Option<&DictionaryRecord> {
        self.tables.get(&table).and_then(|t| t.get(&code))
    }

    pub fn nutrient(&self, code: u32) -> Option<&NutrientInfo> {
        match self.lookup(DictionaryTable::Nutrient, code) {
            Some(DictionaryRecord::Nutrient(n)) => Some(n),
            _ => None,
        }
    }

    /// Derivation for `code`; entries without a code are treated as absent
    pub fn derivation(&self, code: u32) -> Option<&Derivation> {
        match self.lookup(DictionaryTable::Derivation, code) {
            Some(DictionaryRecord::Derivation(d)) if !d.code.is_empty() => Some(d),
            _ => None,
        }
    }

    /// Food group for `code` from one of the two group tables
    pub fn food_group(&self, table: DictionaryTable, code: u32) -> Option<&FoodGroup> {
        match self.lookup(table, code) {
            Some(DictionaryRecord::SrFoodGroup(g)) | Some(DictionaryRecord::SurveyFoodGroup(g))
                if !g.description.is_empty() =>
            {
                Some(g)
            },
            _ => None,
        }
    }
}

/// Loads a reference-table CSV into the store as `{TABLE}:{code}` documents
pub struct DictionaryLoader {
    table: DictionaryTable,
}

impl DictionaryLoader {
    pub fn new(table: DictionaryTable) -> Self {
        Self { table }
    }

    /// Returns the number of records written
    pub async fn load_file(&self, path: &Path, store: &dyn DocumentStore) -> Result<u64> {
        let mut rows = CsvRows::open(path).await?;
        let mut written = 0_u64;

        while let Some(row) = rows.next_row().await? {
            let Some(record) = self.parse(&row) else {
                continue;
            };
            store.update(&record.document_id(), record.into()).await?;
            written += 1;
        }

        info!(table = %self.table, written, path = %path.display(), "Dictionary file loaded");
        Ok(written)
    }

    fn parse(&self, row: &Row<'_>) -> Option<DictionaryRecord> {
        let table = self.table.as_str();
        match self.table {
            DictionaryTable::Nutrient => {
                // Without an id the nutrient can never be looked up
                let Ok(nutrient_id) = row.text(0).parse::<u32>() else {
                    warn!(line = row.line(), raw = row.text(0), "Cannot parse nutrient id, skipping");
                    return None;
                };
                Some(DictionaryRecord::Nutrient(NutrientInfo {
                    nutrient_id,
                    name: row.text(1).to_string(),
                    unit: row.text(2).to_string(),
                    nutrient_no: row.optional_u32(3, "nutrient_nbr"),
                }))
            },
            DictionaryTable::Derivation => Some(DictionaryRecord::Derivation(Derivation {
                id: row.u32(0, "id"),
                code: row.text(1).to_string(),
                description: row.text(2).to_string(),
            })),
            DictionaryTable::SrFoodGroup => Some(DictionaryRecord::SrFoodGroup(FoodGroup {
                id: row.u32(0, "id"),
                code: row.text(1).to_string(),
                description: row.text(2).to_string(),
                last_update: row.text(3).to_string(),
                group_type: table.to_string(),
            })),
            DictionaryTable::SurveyFoodGroup => {
                Some(DictionaryRecord::SurveyFoodGroup(FoodGroup {
                    id: row.u32(0, "id"),
                    description: row.text(1).to_string(),
                    group_type: table.to_string(),
                    ..Default::default()
                }))
            },
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::store::{MemoryStore, StoreError};
    use async_trait::async_trait;
    use fdc_common::types::{Document, Food, NutrientFact};

    fn protein() -> DictionaryRecord {
        DictionaryRecord::Nutrient(NutrientInfo {
            nutrient_id: 203,
            nutrient_no: 203,
            name: "Protein".to_string(),
            unit: "g".to_string(),
        })
    }

    #[test]
    fn test_lookup_present_and_absent_codes() {
        let mut cache = DictionaryCache::new();
        cache.insert_all([protein()]);

        let n = cache.nutrient(203).unwrap();
        assert_eq!((n.name.as_str(), n.unit.as_str()), ("Protein", "g"));
        assert!(cache.nutrient(999).is_none());
        assert!(cache.derivation(203).is_none());
    }

    #[test]
    fn test_blank_derivation_code_is_absent() {
        let mut cache = DictionaryCache::new();
        cache.insert_all([DictionaryRecord::Derivation(Derivation {
            id: 1,
            code: String::new(),
            description: "unused".to_string(),
        })]);
        assert!(cache.derivation(1).is_none());
    }

    #[tokio::test]
    async fn test_load_from_store() {
        let store = MemoryStore::new();
        store.update("NUT:203", protein().into()).await.unwrap();

        let cache = DictionaryCache::load(&store, "gnutdata", &[DictionaryTable::Nutrient], 500)
            .await
            .unwrap();
        assert!(cache.contains_table(DictionaryTable::Nutrient));
        assert_eq!(cache.nutrient(203).unwrap().name, "Protein");
    }

    struct DownStore;

    #[async_trait]
    impl DocumentStore for DownStore {
        async fn get(&self, _id: &str) -> std::result::Result<Option<Food>, StoreError> {
            Ok(None)
        }
        async fn update(&self, _id: &str, _doc: Document) -> std::result::Result<(), StoreError> {
            Ok(())
        }
        async fn bulk_write(&self, _facts: Vec<NutrientFact>) -> std::result::Result<(), StoreError> {
            Ok(())
        }
        async fn get_dictionary(
            &self,
            _namespace: &str,
            _table: DictionaryTable,
            _offset: usize,
            _limit: usize,
        ) -> std::result::Result<Vec<DictionaryRecord>, StoreError> {
            Err(StoreError::Unavailable("connection refused".to_string()))
        }
    }

    #[tokio::test]
    async fn test_load_failure_is_dictionary_error() {
        let err = DictionaryCache::load(&DownStore, "gnutdata", &[DictionaryTable::Derivation], 500)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            IngestError::Dictionary {
                table: DictionaryTable::Derivation,
                ..
            }
        ));
        assert!(err.is_fatal());
    }

    #[tokio::test]
    async fn test_loader_writes_keyed_documents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nutrient.csv");
        std::fs::write(
            &path,
            "1003,Protein,G,203\nbad,Ash,G,207\n1004,Total lipid (fat),G,204\n",
        )
        .unwrap();

        let store = MemoryStore::new();
        let written = DictionaryLoader::new(DictionaryTable::Nutrient)
            .load_file(&path, &store)
            .await
            .unwrap();
        assert_eq!(written, 2);

        let page = store
            .get_dictionary("gnutdata", DictionaryTable::Nutrient, 0, 500)
            .await
            .unwrap();
        assert_eq!(page.len(), 2);
        assert_eq!(page[0].document_id(), "NUT:1003");
    }

    #[tokio::test]
    async fn test_loader_survey_groups() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wweia.csv");
        std::fs::write(&path, "1002,Milk\n").unwrap();

        let store = MemoryStore::new();
        DictionaryLoader::new(DictionaryTable::SurveyFoodGroup)
            .load_file(&path, &store)
            .await
            .unwrap();

        let mut cache = DictionaryCache::new();
        cache.insert_all(
            store
                .get_dictionary("gnutdata", DictionaryTable::SurveyFoodGroup, 0, 10)
                .await
                .unwrap(),
        );
        let group = cache
            .food_group(DictionaryTable::SurveyFoodGroup, 1002)
            .unwrap();
        assert_eq!(group.description, "Milk");
        assert_eq!(group.group_type, "FGFNDDS");
    }
}
