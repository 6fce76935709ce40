//! Ingredient model. Ingredients back dish composition and customization surcharges.

use serde::{Deserialize, Serialize};

use super::dish::default_true;
use super::{Allergens, LocalizedText};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum IngredientCategory {
    Vegetable,
    Meat,
    Seafood,
    Spice,
    Herb,
    Dairy,
    Grain,
    Fruit,
    Sauce,
    Side,
    #[default]
    Other,
}

impl IngredientCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            IngredientCategory::Vegetable => "vegetable",
            IngredientCategory::Meat => "meat",
            IngredientCategory::Seafood => "seafood",
            IngredientCategory::Spice => "spice",
            IngredientCategory::Herb => "herb",
            IngredientCategory::Dairy => "dairy",
            IngredientCategory::Grain => "grain",
            IngredientCategory::Fruit => "fruit",
            IngredientCategory::Sauce => "sauce",
            IngredientCategory::Side => "side",
            IngredientCategory::Other => "other",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Ingredient {
    pub id: String,
    pub name: LocalizedText,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<LocalizedText>,
    #[serde(default)]
    pub category: IngredientCategory,
    /// Surcharge when chosen as a customization
    #[serde(default)]
    pub price: f64,
    #[serde(default)]
    pub allergens: Allergens,
    #[serde(default = "default_true")]
    pub is_active: bool,
    pub created_at: String,
    pub updated_at: String,
    #[serde(default)]
    pub version: i64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateIngredientRequest {
    pub name: LocalizedText,
    #[serde(default)]
    pub description: Option<LocalizedText>,
    #[serde(default)]
    pub category: IngredientCategory,
    #[serde(default)]
    pub price: f64,
    #[serde(default)]
    pub allergens: Allergens,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct UpdateIngredientRequest {
    #[serde(default)]
    pub name: Option<LocalizedText>,
    #[serde(default)]
    pub description: Option<LocalizedText>,
    #[serde(default)]
    pub category: Option<IngredientCategory>,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub allergens: Option<Allergens>,
    #[serde(default)]
    pub is_active: Option<bool>,
    #[serde(default)]
    pub expected_version: Option<i64>,
}
