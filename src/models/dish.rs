//! Dish model.

use serde::{Deserialize, Serialize};

use super::LocalizedText;

/// Highest accepted `spicyLevel`.
pub const MAX_SPICY_LEVEL: u8 = 5;

/// Price of a dish or customization surcharge.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Price {
    pub amount: f64,
    #[serde(default = "default_currency")]
    pub currency: String,
}

pub fn default_currency() -> String {
    "THB".to_string()
}

/// Merchandising badges shown on the menu.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct DishTags {
    pub is_new: bool,
    pub is_popular: bool,
    pub is_chef_special: bool,
    pub is_seasonal: bool,
    pub is_limited_time: bool,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct Dietary {
    pub is_vegetarian: bool,
    pub is_vegan: bool,
    pub is_spicy: bool,
    pub spicy_level: u8,
}

/// The eight declared allergens. Shared by dishes and ingredients.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct Allergens {
    pub gluten: bool,
    pub dairy: bool,
    pub eggs: bool,
    pub nuts: bool,
    pub peanuts: bool,
    pub seafood: bool,
    pub soy: bool,
    pub sesame: bool,
}

/// Customization options, each list holding ingredient ids.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct Customization {
    pub is_customizable: bool,
    pub has_extras: bool,
    pub has_sides: bool,
    pub has_sauces: bool,
    pub extras: Vec<String>,
    pub sides: Vec<String>,
    pub sauces: Vec<String>,
}

impl Customization {
    pub fn ingredient_ids(&self) -> impl Iterator<Item = &String> {
        self.extras.iter().chain(&self.sides).chain(&self.sauces)
    }
}

/// A dish on the menu.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Dish {
    pub id: String,
    pub name: LocalizedText,
    pub description: LocalizedText,
    /// Category id
    pub category: String,
    pub price: Price,
    #[serde(default)]
    pub images: Vec<String>,
    /// Ingredient ids
    #[serde(default)]
    pub ingredients: Vec<String>,
    #[serde(default)]
    pub tags: DishTags,
    #[serde(default)]
    pub dietary: Dietary,
    #[serde(default)]
    pub allergens: Allergens,
    #[serde(default)]
    pub customization: Customization,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub views: i64,
    #[serde(default)]
    pub order: i32,
    pub created_at: String,
    pub updated_at: String,
    /// Internal version for optimistic concurrency control
    #[serde(default)]
    pub version: i64,
}

impl Dish {
    /// Whether the dish uses `ingredient_id` as an ingredient or customization option.
    pub fn references_ingredient(&self, ingredient_id: &str) -> bool {
        self.ingredients
            .iter()
            .chain(self.customization.ingredient_ids())
            .any(|id| id == ingredient_id)
    }
}

pub(crate) fn default_true() -> bool {
    true
}

/// Request body for creating a new dish.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateDishRequest {
    pub name: LocalizedText,
    pub description: LocalizedText,
    pub category: String,
    pub price: Price,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub ingredients: Vec<String>,
    #[serde(default)]
    pub tags: DishTags,
    #[serde(default)]
    pub dietary: Dietary,
    #[serde(default)]
    pub allergens: Allergens,
    #[serde(default)]
    pub customization: Customization,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub order: i32,
}

/// Request body for updating an existing dish. Absent fields are kept.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct UpdateDishRequest {
    #[serde(default)]
    pub name: Option<LocalizedText>,
    #[serde(default)]
    pub description: Option<LocalizedText>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub price: Option<Price>,
    #[serde(default)]
    pub images: Option<Vec<String>>,
    #[serde(default)]
    pub ingredients: Option<Vec<String>>,
    #[serde(default)]
    pub tags: Option<DishTags>,
    #[serde(default)]
    pub dietary: Option<Dietary>,
    #[serde(default)]
    pub allergens: Option<Allergens>,
    #[serde(default)]
    pub customization: Option<Customization>,
    #[serde(default)]
    pub is_active: Option<bool>,
    #[serde(default)]
    pub order: Option<i32>,
    /// Expected version for optimistic concurrency control
    #[serde(default)]
    pub expected_version: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dish_deserializes_camel_case_flags() {
        let dish: Dish = serde_json::from_value(serde_json::json!({
            "id": "d1",
            "name": LocalizedText::uniform("Pad Thai"),
            "description": LocalizedText::uniform("Fried noodles"),
            "category": "3",
            "price": { "amount": 220.0 },
            "tags": { "isPopular": true },
            "dietary": { "isSpicy": true, "spicyLevel": 2 },
            "customization": { "extras": ["i1"], "sauces": ["i2"] },
            "createdAt": "2026-01-01T00:00:00.000Z",
            "updatedAt": "2026-01-01T00:00:00.000Z"
        }))
        .unwrap();

        assert!(dish.tags.is_popular);
        assert!(!dish.tags.is_new);
        assert_eq!(dish.dietary.spicy_level, 2);
        assert_eq!(dish.price.currency, "THB");
        assert!(dish.is_active);
        assert!(dish.references_ingredient("i2"));
        assert!(!dish.references_ingredient("i3"));
    }
}
