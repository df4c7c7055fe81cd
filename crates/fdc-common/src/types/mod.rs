//! Document model shared by the ingest pipeline and the document store
//!
//! Field names serialize in the camelCase shape consumed by the serving layer.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::FdcError;

/// Dataset variant a food belongs to.
///
/// The string form doubles as the id prefix when several datasets share one
/// store (`SR:45001000`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DocType {
    /// Branded food products
    #[serde(rename = "BFPD")]
    Branded,
    /// Food and nutrient database for dietary studies
    #[serde(rename = "FNDDS")]
    Survey,
    /// Standard reference legacy foods
    #[serde(rename = "SR")]
    Legacy,
}

impl DocType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocType::Branded => "BFPD",
            DocType::Survey => "FNDDS",
            DocType::Legacy => "SR",
        }
    }
}

impl std::fmt::Display for DocType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for DocType {
    type Err = FdcError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "BFPD" | "BRANDED" => Ok(DocType::Branded),
            "FNDDS" | "SURVEY" => Ok(DocType::Survey),
            "SR" | "LEGACY" => Ok(DocType::Legacy),
            _ => Err(FdcError::UnknownDocType(s.to_string())),
        }
    }
}

/// Reference tables cached for enrichment joins
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DictionaryTable {
    #[serde(rename = "NUT")]
    Nutrient,
    #[serde(rename = "DERV")]
    Derivation,
    #[serde(rename = "FGSR")]
    SrFoodGroup,
    #[serde(rename = "FGFNDDS")]
    SurveyFoodGroup,
}

impl DictionaryTable {
    pub const ALL: [DictionaryTable; 4] = [
        DictionaryTable::Nutrient,
        DictionaryTable::Derivation,
        DictionaryTable::SrFoodGroup,
        DictionaryTable::SurveyFoodGroup,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DictionaryTable::Nutrient => "NUT",
            DictionaryTable::Derivation => "DERV",
            DictionaryTable::SrFoodGroup => "FGSR",
            DictionaryTable::SurveyFoodGroup => "FGFNDDS",
        }
    }

    /// Store id of a dictionary document, e.g. `NUT:1003`
    pub fn document_id(&self, code: u32) -> String {
        format!("{}:{}", self.as_str(), code)
    }
}

impl std::fmt::Display for DictionaryTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for DictionaryTable {
    type Err = FdcError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "NUT" => Ok(DictionaryTable::Nutrient),
            "DERV" => Ok(DictionaryTable::Derivation),
            "FGSR" => Ok(DictionaryTable::SrFoodGroup),
            "FGFNDDS" => Ok(DictionaryTable::SurveyFoodGroup),
            _ => Err(FdcError::UnknownTable(s.to_string())),
        }
    }
}

/// Denormalized food document: one per primary row, enriched in place by the
/// child mergers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Food {
    pub fdc_id: String,
    #[serde(rename = "foodDescription")]
    pub description: String,
    #[serde(rename = "company", default)]
    pub manufacturer: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub upc: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub ingredients: String,
    #[serde(rename = "dataSource", default)]
    pub source: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub ndb_no: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publication_date: Option<NaiveDate>,
    #[serde(rename = "foodGroup", default, skip_serializing_if = "Option::is_none")]
    pub group: Option<FoodGroup>,
    #[serde(rename = "servingSizes", default, skip_serializing_if = "Vec::is_empty")]
    pub servings: Vec<Serving>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub nutrients: Vec<NutrientData>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub input_foods: Vec<InputFood>,
    #[serde(rename = "type", default = "food_type")]
    pub doc_type: String,
}

fn food_type() -> String {
    Food::DOC_TYPE.to_string()
}

impl Food {
    pub const DOC_TYPE: &'static str = "FOOD";

    pub fn new(fdc_id: impl Into<String>, description: impl Into<String>, source: DocType) -> Self {
        Self {
            fdc_id: fdc_id.into(),
            description: description.into(),
            source: source.as_str().to_string(),
            doc_type: food_type(),
            ..Default::default()
        }
    }
}

/// Household serving size attached to a food
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Serving {
    #[serde(rename = "100UnitNutrientBasis")]
    pub nutrient_basis: String,
    #[serde(rename = "householdServingUom")]
    pub description: String,
    #[serde(rename = "householdServingValue")]
    pub amount: f32,
    #[serde(rename = "weightInGmOrMl", default)]
    pub weight: f32,
    #[serde(rename = "dataPoints", default, skip_serializing_if = "is_zero")]
    pub datapoints: i32,
}

fn is_zero(v: &i32) -> bool {
    *v == 0
}

/// One ingredient line of a survey food recipe
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InputFood {
    pub seq_no: i32,
    pub sr_code: i32,
    pub description: String,
    pub amount: f32,
    pub unit: String,
    pub portion: String,
    pub portion_description: String,
    pub weight: f32,
}

/// Nutrient value embedded in a food document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NutrientData {
    #[serde(rename = "nutrientNumber")]
    pub nutrient_no: u32,
    #[serde(rename = "nutrientName")]
    pub nutrient: String,
    pub unit: String,
    #[serde(rename = "valuePer100UnitServing")]
    pub value: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub derivation: Option<Derivation>,
}

/// Independently addressable nutrient measurement for one food.
///
/// Carries a snapshot of the parent food's descriptive fields taken when the
/// fact was written; it is not kept in sync afterwards.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NutrientFact {
    pub id: String,
    pub fdc_id: String,
    #[serde(rename = "dataSource")]
    pub source: String,
    #[serde(rename = "foodDescription")]
    pub description: String,
    #[serde(rename = "company")]
    pub manufacturer: String,
    pub nutrient_id: u32,
    #[serde(rename = "nutrientNumber")]
    pub nutrient_no: u32,
    #[serde(rename = "nutrientName")]
    pub nutrient: String,
    pub unit: String,
    #[serde(rename = "valuePer100UnitServing")]
    pub value: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub derivation: Option<Derivation>,
    #[serde(default)]
    pub datapoints: i32,
    #[serde(default)]
    pub min: f32,
    #[serde(default)]
    pub max: f32,
    #[serde(rename = "type")]
    pub doc_type: String,
}

impl NutrientFact {
    pub const DOC_TYPE: &'static str = "NUTDATA";

    /// Fact id: `{entityId}_{nutrientCode}`
    pub fn fact_id(entity_id: &str, code: u32) -> String {
        format!("{}_{}", entity_id, code)
    }
}

/// `NUT` dictionary entry
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NutrientInfo {
    pub nutrient_id: u32,
    #[serde(rename = "nutrientno")]
    pub nutrient_no: u32,
    pub name: String,
    pub unit: String,
}

/// `DERV` dictionary entry, also embedded verbatim into nutrient values
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Derivation {
    pub id: u32,
    pub code: String,
    pub description: String,
}

/// `FGSR` / `FGFNDDS` dictionary entry, and the group embedded in a food
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FoodGroup {
    pub id: u32,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub code: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub last_update: String,
    /// Table the group came from (`FGSR`, `FGFNDDS`, or `FGGPC` for branded categories)
    #[serde(rename = "type")]
    pub group_type: String,
}

/// A reference-table row, tagged by table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum DictionaryRecord {
    #[serde(rename = "NUT")]
    Nutrient(NutrientInfo),
    #[serde(rename = "DERV")]
    Derivation(Derivation),
    #[serde(rename = "FGSR")]
    SrFoodGroup(FoodGroup),
    #[serde(rename = "FGFNDDS")]
    SurveyFoodGroup(FoodGroup),
}

impl DictionaryRecord {
    pub fn table(&self) -> DictionaryTable {
        match self {
            DictionaryRecord::Nutrient(_) => DictionaryTable::Nutrient,
            DictionaryRecord::Derivation(_) => DictionaryTable::Derivation,
            DictionaryRecord::SrFoodGroup(_) => DictionaryTable::SrFoodGroup,
            DictionaryRecord::SurveyFoodGroup(_) => DictionaryTable::SurveyFoodGroup,
        }
    }

    /// Lookup code the record is keyed by
    pub fn code(&self) -> u32 {
        match self {
            DictionaryRecord::Nutrient(n) => n.nutrient_id,
            DictionaryRecord::Derivation(d) => d.id,
            DictionaryRecord::SrFoodGroup(g) | DictionaryRecord::SurveyFoodGroup(g) => g.id,
        }
    }

    pub fn document_id(&self) -> String {
        self.table().document_id(self.code())
    }
}

/// Anything the ingest writes through `update`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Document {
    Food(Box<Food>),
    Dictionary(DictionaryRecord),
}

impl From<Food> for Document {
    fn from(food: Food) -> Self {
        Document::Food(Box::new(food))
    }
}

impl From<DictionaryRecord> for Document {
    fn from(record: DictionaryRecord) -> Self {
        Document::Dictionary(record)
    }
}
