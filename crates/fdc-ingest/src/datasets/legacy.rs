//! Standard reference legacy foods (`SR`)

use std::path::Path;

use fdc_common::types::{DictionaryTable, DocType};

use super::{task, DatasetPlan, FOOD_FILE};
use crate::facts::{BatchedFactWriter, FactLayout};
use crate::merger::{GroupedChildMerger, LegacyPortions, NdbCrosswalk};
use crate::primary::{PrimaryEntityLoader, PrimaryLayout};

pub const FOOD_PORTION_FILE: &str = "food_portion.csv";
pub const SR_LEGACY_FOOD_FILE: &str = "sr_legacy_food.csv";
pub const FOOD_NUTRIENT_FILE: &str = "food_nutrient.csv";

/// Category code column of the legacy primary file
const FOOD_CATEGORY_COLUMN: usize = 3;

pub fn plan(dir: &Path) -> DatasetPlan {
    let layout = PrimaryLayout {
        group: Some((FOOD_CATEGORY_COLUMN, DictionaryTable::SrFoodGroup)),
        ..Default::default()
    };

    DatasetPlan {
        doc_type: DocType::Legacy,
        dictionaries: vec![
            DictionaryTable::Nutrient,
            DictionaryTable::Derivation,
            DictionaryTable::SrFoodGroup,
        ],
        primary: PrimaryEntityLoader::new(dir.join(FOOD_FILE), layout),
        stages: Vec::new(),
        children: vec![
            task(GroupedChildMerger::new(dir.join(FOOD_PORTION_FILE), LegacyPortions)),
            task(GroupedChildMerger::new(dir.join(SR_LEGACY_FOOD_FILE), NdbCrosswalk)),
            task(BatchedFactWriter::new(
                dir.join(FOOD_NUTRIENT_FILE),
                FactLayout::default(),
            )),
        ],
    }
}
