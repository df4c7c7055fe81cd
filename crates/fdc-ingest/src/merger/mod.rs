//! Grouped child merge
//!
//! Folds a child extract, sorted by its parent key, into the foods written by
//! the primary loader. Rows are accumulated while the key stays the same; when
//! the key changes the accumulated run is flushed into its parent:
//!
//! 1. lock the parent id (shared with every other task of the run)
//! 2. fetch the current parent document
//! 3. set the kind's field from the accumulated records
//! 4. upsert the parent
//!
//! Because each flush re-reads the parent under its lock, two mergers that
//! touch different fields of the same food never lose each other's writes.
//!
//! The file must be sorted by key. A key that appears in two separate runs is
//! flushed twice and the later run replaces the earlier one.

pub mod kinds;

use std::path::PathBuf;

use async_trait::async_trait;
use fdc_common::types::Food;
use tracing::{debug, info, warn};

use crate::context::IngestContext;
use crate::counts::CountKind;
use crate::dictionary::DictionaryCache;
use crate::error::Result;
use crate::orchestrator::ChildLoader;
use crate::rows::{CsvRows, Row};

pub use kinds::{
    BrandedProducts, EmbeddedNutrients, InputFoods, LegacyPortions, NdbCrosswalk, SurveyFoodGroup,
    SurveyPortions,
};

/// What one child file contributes to its parent food
pub trait ChildKind: Send + Sync + 'static {
    /// Parsed form of one row
    type Record: Send;

    /// Task name used in logs and run reports
    fn name(&self) -> &'static str;

    /// Column holding the parent's raw id
    fn key_column(&self) -> usize;

    /// Counter fed per consumed row
    fn count_kind(&self) -> CountKind;

    /// Parse a row; bad fields are defaulted, never rejected
    fn parse(&self, row: &Row<'_>, dictionaries: &DictionaryCache) -> Self::Record;

    /// Write one contiguous run of records into the parent
    fn apply(&self, food: &mut Food, records: Vec<Self::Record>);
}

pub struct GroupedChildMerger<K> {
    path: PathBuf,
    kind: K,
}

impl<K: ChildKind> GroupedChildMerger<K> {
    pub fn new(path: impl Into<PathBuf>, kind: K) -> Self {
        Self {
            path: path.into(),
            kind,
        }
    }

    /// Merge the whole file; returns the number of rows consumed
    pub async fn merge(&self, ctx: &IngestContext) -> Result<u64> {
        let mut rows = CsvRows::open(&self.path).await?;
        let kind = self.kind.count_kind();
        let interval = ctx.config.progress_every();

        let mut current: Option<String> = None;
        let mut accumulator: Vec<K::Record> = Vec::new();
        let mut consumed = 0_u64;

        info!("{}: merging {}", self.kind.name(), self.path.display());

        while let Some(row) = rows.next_row().await? {
            let raw = row.text(self.kind.key_column());
            if raw.is_empty() {
                warn!(
                    task = self.kind.name(),
                    line = row.line(),
                    "Row without a parent key, skipping"
                );
                continue;
            }

            let key = ctx.ids.entity_id(raw);
            if current.as_deref() != Some(key.as_str()) {
                if let Some(previous) = current.take() {
                    self.flush(ctx, &previous, std::mem::take(&mut accumulator))
                        .await?;
                }
                current = Some(key);
            }

            accumulator.push(self.kind.parse(&row, &ctx.dictionaries));
            consumed += 1;
            let total = ctx.counts.increment(kind);
            if total % interval == 0 {
                info!(task = self.kind.name(), total, "{} progress", kind.as_str());
            }
        }

        if let Some(last) = current {
            if !accumulator.is_empty() {
                self.flush(ctx, &last, accumulator).await?;
            }
        }

        info!(task = self.kind.name(), rows = consumed, "Merge complete");
        Ok(consumed)
    }

    async fn flush(&self, ctx: &IngestContext, key: &str, records: Vec<K::Record>) -> Result<()> {
        let _guard = ctx.locks.lock(key).await;

        let Some(mut food) = ctx.store.get(key).await? else {
            warn!(
                task = self.kind.name(),
                fdc_id = key,
                rows = records.len(),
                "Parent food not found, dropping its rows"
            );
            ctx.counts.add_orphaned(records.len() as u64);
            return Ok(());
        };

        debug!(task = self.kind.name(), fdc_id = key, rows = records.len(), "Flushing run");
        self.kind.apply(&mut food, records);
        ctx.store.update(key, food.into()).await?;
        Ok(())
    }
}

#[async_trait]
impl<K: ChildKind> ChildLoader for GroupedChildMerger<K> {
    fn name(&self) -> &str {
        self.kind.name()
    }

    async fn run(&self, ctx: &IngestContext) -> Result<u64> {
        self.merge(ctx).await
    }
}
