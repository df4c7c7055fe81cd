//! Primary food loader
//!
//! Streams the primary extract and upserts one base [`Food`] per row. The
//! write is a full replacement, so loading the same file twice leaves the
//! store in the same state.

use std::path::PathBuf;

use fdc_common::types::{DictionaryTable, Food};
use tracing::{debug, info, warn};

use crate::context::IngestContext;
use crate::counts::CountKind;
use crate::error::Result;
use crate::rows::{CsvRows, Row};

/// Column positions in the primary file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrimaryLayout {
    pub id: usize,
    pub description: usize,
    pub publication_date: usize,
    pub manufacturer: Option<usize>,
    /// Category code column and the table it resolves through
    pub group: Option<(usize, DictionaryTable)>,
}

impl Default for PrimaryLayout {
    fn default() -> Self {
        Self {
            id: 0,
            description: 2,
            publication_date: 4,
            manufacturer: None,
            group: None,
        }
    }
}

pub struct PrimaryEntityLoader {
    path: PathBuf,
    layout: PrimaryLayout,
}

impl PrimaryEntityLoader {
    pub fn new(path: impl Into<PathBuf>, layout: PrimaryLayout) -> Self {
        Self {
            path: path.into(),
            layout,
        }
    }

    /// Load every row; returns the number of foods written.
    ///
    /// Open and read failures are fatal to the run. Store failures stop the
    /// loader at the failing row.
    pub async fn run(&self, ctx: &IngestContext) -> Result<u64> {
        let mut rows = CsvRows::open(&self.path).await?;
        let interval = ctx.config.progress_every();
        let mut written = 0_u64;

        info!("Loading foods from {}", self.path.display());

        while let Some(row) = rows.next_row().await? {
            let Some(food) = self.parse(&row, ctx) else {
                continue;
            };
            let id = ctx.ids.entity_id(&food.fdc_id);
            ctx.store.update(&id, food.into()).await?;

            written += 1;
            let total = ctx.counts.increment(CountKind::Foods);
            if total % interval == 0 {
                info!(foods = total, "Primary load progress");
            }
        }

        info!(foods = written, path = %self.path.display(), "Primary load complete");
        Ok(written)
    }

    fn parse(&self, row: &Row<'_>, ctx: &IngestContext) -> Option<Food> {
        let layout = &self.layout;
        let id = row.text(layout.id);
        if id.is_empty() {
            warn!(
                file = %self.path.display(),
                line = row.line(),
                "Row without an id, skipping"
            );
            return None;
        }

        let mut food = Food::new(id, row.text(layout.description), ctx.ids.doc_type());
        food.publication_date = row.date(layout.publication_date, "publication_date");

        if let Some(col) = layout.manufacturer {
            food.manufacturer = row.text(col).to_string();
        }

        if let Some((col, table)) = layout.group {
            let code = row.optional_u32(col, "food_category_id");
            food.group = ctx.dictionaries.food_group(table, code).cloned();
            if food.group.is_none() && code != 0 {
                debug!(fdc_id = id, code, table = %table, "Food group not in dictionary");
            }
        }

        Some(food)
    }
}
