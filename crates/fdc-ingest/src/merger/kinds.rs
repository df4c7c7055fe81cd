//! Child file kinds of the three dataset variants
//!
//! Each kind names the parent field it owns. A flush replaces that field with
//! the run it was given and leaves every other field as fetched.

use fdc_common::types::{
    DictionaryTable, Food, FoodGroup, InputFood, NutrientData, Serving,
};

use super::ChildKind;
use crate::counts::CountKind;
use crate::dictionary::DictionaryCache;
use crate::rows::Row;

/// Group type of branded food categories; they have no dictionary of their own
pub const BRANDED_CATEGORY_TYPE: &str = "FGGPC";

/// `branded_food.csv`: product details from a run's first row, servings from
/// every row
#[derive(Debug, Clone, Copy, Default)]
pub struct BrandedProducts;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BrandedRow {
    pub manufacturer: String,
    pub upc: String,
    pub ingredients: String,
    pub category: String,
    pub source: String,
    pub serving: Serving,
}

impl ChildKind for BrandedProducts {
    type Record = BrandedRow;

    fn name(&self) -> &'static str {
        "branded_food"
    }

    fn key_column(&self) -> usize {
        0
    }

    fn count_kind(&self) -> CountKind {
        CountKind::Servings
    }

    fn parse(&self, row: &Row<'_>, _dictionaries: &DictionaryCache) -> BrandedRow {
        BrandedRow {
            manufacturer: row.text(1).to_string(),
            upc: row.text(2).to_string(),
            ingredients: row.text(3).to_string(),
            category: row.text(7).to_string(),
            source: row.text(8).to_string(),
            serving: Serving {
                amount: row.f32(4, "serving_size"),
                nutrient_basis: row.text(5).to_string(),
                description: row.text(6).to_string(),
                ..Default::default()
            },
        }
    }

    fn apply(&self, food: &mut Food, records: Vec<BrandedRow>) {
        let mut records = records.into_iter();
        let Some(first) = records.next() else {
            return;
        };

        food.manufacturer = first.manufacturer;
        food.upc = first.upc;
        food.ingredients = first.ingredients;
        if !first.source.is_empty() {
            food.source = first.source;
        }
        food.group = (!first.category.is_empty()).then(|| FoodGroup {
            description: first.category,
            group_type: BRANDED_CATEGORY_TYPE.to_string(),
            ..Default::default()
        });

        food.servings = std::iter::once(first.serving)
            .chain(records.map(|r| r.serving))
            .collect();
    }
}

/// Survey `food_portion.csv`; weights are always in grams
#[derive(Debug, Clone, Copy, Default)]
pub struct SurveyPortions;

impl ChildKind for SurveyPortions {
    type Record = Serving;

    fn name(&self) -> &'static str {
        "food_portion"
    }

    fn key_column(&self) -> usize {
        1
    }

    fn count_kind(&self) -> CountKind {
        CountKind::Servings
    }

    fn parse(&self, row: &Row<'_>, _dictionaries: &DictionaryCache) -> Serving {
        Serving {
            nutrient_basis: "g".to_string(),
            description: row.text(5).to_string(),
            amount: row.f32(3, "amount"),
            weight: row.f32(7, "gram_weight"),
            datapoints: 0,
        }
    }

    fn apply(&self, food: &mut Food, records: Vec<Serving>) {
        food.servings = records;
    }
}

/// Legacy `food_portion.csv`
#[derive(Debug, Clone, Copy, Default)]
pub struct LegacyPortions;

impl ChildKind for LegacyPortions {
    type Record = Serving;

    fn name(&self) -> &'static str {
        "food_portion"
    }

    fn key_column(&self) -> usize {
        1
    }

    fn count_kind(&self) -> CountKind {
        CountKind::Servings
    }

    fn parse(&self, row: &Row<'_>, _dictionaries: &DictionaryCache) -> Serving {
        Serving {
            amount: row.f32(3, "amount"),
            nutrient_basis: row.text(5).to_string(),
            description: row.text(6).to_string(),
            weight: row.f32(7, "gram_weight"),
            datapoints: row.optional_i32(8, "data_points"),
        }
    }

    fn apply(&self, food: &mut Food, records: Vec<Serving>) {
        food.servings = records;
    }
}

/// Survey `food_nutrient.csv`, embedded in the food and named through `NUT`
#[derive(Debug, Clone, Copy, Default)]
pub struct EmbeddedNutrients;

impl ChildKind for EmbeddedNutrients {
    type Record = NutrientData;

    fn name(&self) -> &'static str {
        "food_nutrient"
    }

    fn key_column(&self) -> usize {
        1
    }

    fn count_kind(&self) -> CountKind {
        CountKind::Nutrients
    }

    fn parse(&self, row: &Row<'_>, dictionaries: &DictionaryCache) -> NutrientData {
        let code = row.u32(2, "nutrient_id");
        let info = dictionaries.nutrient(code);
        NutrientData {
            nutrient_no: info.map_or(code, |n| n.nutrient_no),
            nutrient: info.map(|n| n.name.clone()).unwrap_or_default(),
            unit: info.map(|n| n.unit.clone()).unwrap_or_default(),
            value: row.f32(3, "amount"),
            derivation: None,
        }
    }

    fn apply(&self, food: &mut Food, records: Vec<NutrientData>) {
        food.nutrients = records;
    }
}

/// Survey `input_food.csv`: the recipe lines of a survey food
#[derive(Debug, Clone, Copy, Default)]
pub struct InputFoods;

impl ChildKind for InputFoods {
    type Record = InputFood;

    fn name(&self) -> &'static str {
        "input_food"
    }

    fn key_column(&self) -> usize {
        1
    }

    fn count_kind(&self) -> CountKind {
        CountKind::Other
    }

    fn parse(&self, row: &Row<'_>, _dictionaries: &DictionaryCache) -> InputFood {
        InputFood {
            seq_no: row.i32(3, "seq_num"),
            amount: row.f32(4, "amount"),
            sr_code: row.i32(5, "sr_code"),
            description: row.text(6).to_string(),
            unit: row.text(7).to_string(),
            portion: row.text(8).to_string(),
            portion_description: row.text(9).to_string(),
            weight: row.f32(10, "gram_weight"),
        }
    }

    fn apply(&self, food: &mut Food, records: Vec<InputFood>) {
        food.input_foods = records;
    }
}

/// Survey `survey_fndds_food.csv`: food group via `FGFNDDS`. An unknown code
/// clears the group.
#[derive(Debug, Clone, Copy, Default)]
pub struct SurveyFoodGroup;

impl ChildKind for SurveyFoodGroup {
    type Record = Option<FoodGroup>;

    fn name(&self) -> &'static str {
        "survey_fndds_food"
    }

    fn key_column(&self) -> usize {
        0
    }

    fn count_kind(&self) -> CountKind {
        CountKind::Other
    }

    fn parse(&self, row: &Row<'_>, dictionaries: &DictionaryCache) -> Option<FoodGroup> {
        let code = row.optional_u32(2, "wweia_category_code");
        dictionaries
            .food_group(DictionaryTable::SurveyFoodGroup, code)
            .cloned()
    }

    fn apply(&self, food: &mut Food, records: Vec<Option<FoodGroup>>) {
        if let Some(last) = records.into_iter().last() {
            food.group = last;
        }
    }
}

/// Legacy `sr_legacy_food.csv`: NDB number crosswalk
#[derive(Debug, Clone, Copy, Default)]
pub struct NdbCrosswalk;

impl ChildKind for NdbCrosswalk {
    type Record = String;

    fn name(&self) -> &'static str {
        "sr_legacy_food"
    }

    fn key_column(&self) -> usize {
        0
    }

    fn count_kind(&self) -> CountKind {
        CountKind::Other
    }

    fn parse(&self, row: &Row<'_>, _dictionaries: &DictionaryCache) -> String {
        row.text(1).to_string()
    }

    fn apply(&self, food: &mut Food, records: Vec<String>) {
        if let Some(ndb_no) = records.into_iter().last() {
            food.ndb_no = ndb_no;
        }
    }
}
