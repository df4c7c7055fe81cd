//! Batched nutrient fact writer
//!
//! Turns each nutrient row into an independent [`NutrientFact`] carrying a
//! snapshot of its parent's descriptive fields. The parent is fetched once per
//! key transition, so the file must be sorted by parent key.
//!
//! Facts are buffered and bulk-written every `fact_batch_size` rows, plus once
//! at end of file for the remainder. A rejected batch is logged, counted as
//! dropped, and not retried.

use std::path::PathBuf;

use async_trait::async_trait;
use fdc_common::types::NutrientFact;
use tracing::{debug, info, warn};

use crate::context::IngestContext;
use crate::counts::CountKind;
use crate::error::Result;
use crate::orchestrator::ChildLoader;
use crate::rows::{CsvRows, Row};

/// Column positions in a nutrient fact file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FactLayout {
    pub key: usize,
    pub nutrient: usize,
    pub value: usize,
    pub datapoints: usize,
    pub derivation: usize,
    pub min: usize,
    pub max: usize,
}

impl Default for FactLayout {
    fn default() -> Self {
        Self {
            key: 1,
            nutrient: 2,
            value: 3,
            datapoints: 4,
            derivation: 5,
            min: 6,
            max: 7,
        }
    }
}

/// Parent fields copied into every fact of one key
#[derive(Debug, Clone, Default, PartialEq)]
struct ParentContext {
    description: String,
    manufacturer: String,
    source: String,
}

pub struct BatchedFactWriter {
    path: PathBuf,
    layout: FactLayout,
}

impl BatchedFactWriter {
    pub fn new(path: impl Into<PathBuf>, layout: FactLayout) -> Self {
        Self {
            path: path.into(),
            layout,
        }
    }

    /// Write the whole file; returns the number of rows consumed.
    ///
    /// Rows in rejected batches are still counted as consumed; the loss shows
    /// up in `dropped_facts`.
    pub async fn write(&self, ctx: &IngestContext) -> Result<u64> {
        let mut rows = CsvRows::open(&self.path).await?;
        let batch_size = ctx.config.fact_batch_size;
        let interval = ctx.config.progress_every();

        let mut current: Option<String> = None;
        let mut parent = ParentContext::default();
        let mut buffer: Vec<NutrientFact> = Vec::with_capacity(batch_size);
        let mut consumed = 0_u64;

        info!("Writing nutrient facts from {}", self.path.display());

        while let Some(row) = rows.next_row().await? {
            let raw = row.text(self.layout.key);
            if raw.is_empty() {
                warn!(line = row.line(), "Nutrient row without a parent key, skipping");
                continue;
            }

            let key = ctx.ids.entity_id(raw);
            if current.as_deref() != Some(key.as_str()) {
                parent = self.parent_context(ctx, &key).await?;
                current = Some(key.clone());
            }

            buffer.push(self.fact(&row, &key, &parent, ctx));
            consumed += 1;
            let total = ctx.counts.increment(CountKind::Nutrients);
            if total % interval == 0 {
                info!(nutrients = total, "Nutrient fact progress");
            }

            if buffer.len() >= batch_size {
                self.flush(ctx, &mut buffer).await;
            }
        }

        if !buffer.is_empty() {
            self.flush(ctx, &mut buffer).await;
        }

        info!(rows = consumed, "Nutrient facts complete");
        Ok(consumed)
    }

    async fn parent_context(&self, ctx: &IngestContext, key: &str) -> Result<ParentContext> {
        match ctx.store.get(key).await? {
            Some(food) => Ok(ParentContext {
                description: food.description,
                manufacturer: food.manufacturer,
                source: food.source,
            }),
            None => {
                warn!(fdc_id = key, "Parent food not found, writing facts without context");
                Ok(ParentContext {
                    source: ctx.ids.doc_type().to_string(),
                    ..Default::default()
                })
            },
        }
    }

    fn fact(
        &self,
        row: &Row<'_>,
        key: &str,
        parent: &ParentContext,
        ctx: &IngestContext,
    ) -> NutrientFact {
        let layout = &self.layout;
        let code = row.u32(layout.nutrient, "nutrient_id");
        let info = ctx.dictionaries.nutrient(code);
        let derivation_code = row.optional_u32(layout.derivation, "derivation_id");

        NutrientFact {
            id: NutrientFact::fact_id(key, code),
            fdc_id: key.to_string(),
            source: parent.source.clone(),
            description: parent.description.clone(),
            manufacturer: parent.manufacturer.clone(),
            nutrient_id: code,
            nutrient_no: info.map_or(0, |n| n.nutrient_no),
            nutrient: info.map(|n| n.name.clone()).unwrap_or_default(),
            unit: info.map(|n| n.unit.clone()).unwrap_or_default(),
            value: row.f32(layout.value, "amount"),
            derivation: ctx.dictionaries.derivation(derivation_code).cloned(),
            datapoints: row.optional_i32(layout.datapoints, "data_points"),
            min: row.optional_f32(layout.min, "min"),
            max: row.optional_f32(layout.max, "max"),
            doc_type: NutrientFact::DOC_TYPE.to_string(),
        }
    }

    async fn flush(&self, ctx: &IngestContext, buffer: &mut Vec<NutrientFact>) {
        let batch = std::mem::take(buffer);
        let size = batch.len();
        match ctx.store.bulk_write(batch).await {
            Ok(()) => debug!(size, "Fact batch written"),
            Err(e) => {
                warn!(size, error = %e, "Fact batch rejected, dropping it");
                ctx.counts.add_dropped_batch(size as u64);
            },
        }
    }
}

#[async_trait]
impl ChildLoader for BatchedFactWriter {
    fn name(&self) -> &str {
        "nutrient_facts"
    }

    async fn run(&self, ctx: &IngestContext) -> Result<u64> {
        self.write(ctx).await
    }
}
