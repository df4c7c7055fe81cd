//! Branded food products (`BFPD`)
//!
//! Product details and servings are merged from `branded_food.csv` before the
//! nutrient facts are written, so every fact sees its product's manufacturer.

use std::path::Path;

use fdc_common::types::{DictionaryTable, DocType};

use super::{task, DatasetPlan, FOOD_FILE};
use crate::facts::{BatchedFactWriter, FactLayout};
use crate::merger::{BrandedProducts, GroupedChildMerger};
use crate::primary::{PrimaryEntityLoader, PrimaryLayout};

pub const BRANDED_FOOD_FILE: &str = "branded_food.csv";
pub const FOOD_NUTRIENT_FILE: &str = "food_nutrient.csv";

pub fn plan(dir: &Path) -> DatasetPlan {
    DatasetPlan {
        doc_type: DocType::Branded,
        dictionaries: vec![DictionaryTable::Nutrient, DictionaryTable::Derivation],
        primary: PrimaryEntityLoader::new(dir.join(FOOD_FILE), PrimaryLayout::default()),
        stages: vec![task(GroupedChildMerger::new(
            dir.join(BRANDED_FOOD_FILE),
            BrandedProducts,
        ))],
        children: vec![task(BatchedFactWriter::new(
            dir.join(FOOD_NUTRIENT_FILE),
            FactLayout::default(),
        ))],
    }
}
