//! FDC Ingest Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Loads FoodData Central CSV extracts into a document store.
//!
//! # Pipeline
//!
//! - **Dictionaries**: reference tables cached for enrichment ([`dictionary`])
//! - **Primary load**: one food document per row of `food.csv` ([`primary`])
//! - **Child merges**: sorted child files folded into their parent foods,
//!   one concurrent task per file ([`merger`])
//! - **Nutrient facts**: independent fact documents written in batches
//!   ([`facts`])
//!
//! [`orchestrator::IngestOrchestrator`] sequences the stages for one
//! [`datasets::DatasetPlan`].
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//! use std::sync::Arc;
//!
//! use fdc_common::types::DocType;
//! use fdc_ingest::{DatasetPlan, IngestConfig, IngestOrchestrator, MemoryStore};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let store = Arc::new(MemoryStore::new());
//!     let plan = DatasetPlan::for_dataset(DocType::Legacy, Path::new("./data/sr"));
//!     let report = IngestOrchestrator::new(store, IngestConfig::default())
//!         .run(plan)
//!         .await?;
//!     println!("{} foods", report.counts.foods);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod context;
pub mod counts;
pub mod datasets;
pub mod dictionary;
pub mod error;
pub mod facts;
pub mod locks;
pub mod merger;
pub mod orchestrator;
pub mod primary;
pub mod rows;
pub mod store;

pub use config::IngestConfig;
pub use context::{IdScheme, IngestContext};
pub use counts::{CountKind, Counts, CountsSnapshot};
pub use datasets::DatasetPlan;
pub use dictionary::{DictionaryCache, DictionaryLoader};
pub use error::{IngestError, Result};
pub use facts::{BatchedFactWriter, FactLayout};
pub use merger::{ChildKind, GroupedChildMerger};
pub use orchestrator::{ChildLoader, IngestOrchestrator, RunReport, RunState, TaskOutcome};
pub use primary::{PrimaryEntityLoader, PrimaryLayout};
pub use store::{DocumentStore, MemoryStore, StoreError};
