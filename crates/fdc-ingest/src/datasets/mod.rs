//! Dataset variants
//!
//! Each variant names the dictionaries it needs, how its primary file is laid
//! out, and which child loaders run over which files. All files are headerless
//! CSV extracts in one directory.
//!
//! Stages run one after another once the primary load is done; children then
//! run concurrently. A loader belongs in `stages` when children copy fields it
//! writes.

pub mod branded;
pub mod legacy;
pub mod survey;

use std::path::Path;
use std::sync::Arc;

use fdc_common::types::{DictionaryTable, DocType};

use crate::orchestrator::ChildLoader;
use crate::primary::PrimaryEntityLoader;

/// Primary file name shared by all variants
pub const FOOD_FILE: &str = "food.csv";

/// Everything the orchestrator needs to run one dataset
pub struct DatasetPlan {
    pub doc_type: DocType,
    pub dictionaries: Vec<DictionaryTable>,
    pub primary: PrimaryEntityLoader,
    /// Run in order before any child starts
    pub stages: Vec<Arc<dyn ChildLoader>>,
    pub children: Vec<Arc<dyn ChildLoader>>,
}

/// Box a loader for the plan's task list
pub fn task(loader: impl ChildLoader + 'static) -> Arc<dyn ChildLoader> {
    Arc::new(loader)
}

impl DatasetPlan {
    /// Standard plan for `doc_type` reading from `dir`
    pub fn for_dataset(doc_type: DocType, dir: &Path) -> Self {
        match doc_type {
            DocType::Branded => branded::plan(dir),
            DocType::Survey => survey::plan(dir),
            DocType::Legacy => legacy::plan(dir),
        }
    }

    pub fn stage_names(&self) -> Vec<&str> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    pub fn child_names(&self) -> Vec<&str> {
        self.children.iter().map(|c| c.name()).collect()
    }
}
