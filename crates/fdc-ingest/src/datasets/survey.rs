//! Survey foods (`FNDDS`)
//!
//! Everything is embedded in the food document: portions, nutrients, input
//! foods and the WWEIA food group each come from their own file.

use std::path::Path;

use fdc_common::types::{DictionaryTable, DocType};

use super::{task, DatasetPlan, FOOD_FILE};
use crate::merger::{
    EmbeddedNutrients, GroupedChildMerger, InputFoods, SurveyFoodGroup, SurveyPortions,
};
use crate::primary::{PrimaryEntityLoader, PrimaryLayout};

pub const FOOD_PORTION_FILE: &str = "food_portion.csv";
pub const FOOD_NUTRIENT_FILE: &str = "food_nutrient.csv";
pub const INPUT_FOOD_FILE: &str = "input_food.csv";
pub const SURVEY_FOOD_FILE: &str = "survey_fndds_food.csv";

pub fn plan(dir: &Path) -> DatasetPlan {
    DatasetPlan {
        doc_type: DocType::Survey,
        dictionaries: vec![DictionaryTable::Nutrient, DictionaryTable::SurveyFoodGroup],
        primary: PrimaryEntityLoader::new(dir.join(FOOD_FILE), PrimaryLayout::default()),
        stages: Vec::new(),
        children: vec![
            task(GroupedChildMerger::new(dir.join(FOOD_PORTION_FILE), SurveyPortions)),
            task(GroupedChildMerger::new(dir.join(FOOD_NUTRIENT_FILE), EmbeddedNutrients)),
            task(GroupedChildMerger::new(dir.join(INPUT_FOOD_FILE), InputFoods)),
            task(GroupedChildMerger::new(dir.join(SURVEY_FOOD_FILE), SurveyFoodGroup)),
        ],
    }
}
