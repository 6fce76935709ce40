//! Bundled starter menu, inserted into an empty catalog on first start.

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

use crate::errors::AppError;
use crate::models::{now_timestamp, Category, Dish, Ingredient};

const BUNDLED_MENU: &str = include_str!("../../seed/menu.json");

#[derive(Debug, Deserialize)]
struct RawSeed {
    #[serde(default)]
    categories: Vec<Value>,
    #[serde(default)]
    dishes: Vec<Value>,
    #[serde(default)]
    ingredients: Vec<Value>,
}

/// A complete catalog ready to be inserted.
#[derive(Debug, Clone)]
pub struct SeedData {
    pub categories: Vec<Category>,
    pub dishes: Vec<Dish>,
    pub ingredients: Vec<Ingredient>,
}

impl SeedData {
    /// The menu shipped with the binary.
    pub fn bundled() -> Result<Self, AppError> {
        Self::from_json(BUNDLED_MENU)
    }

    /// Parse a seed document. Timestamps may be omitted and are filled with the current time.
    pub fn from_json(text: &str) -> Result<Self, AppError> {
        let raw: RawSeed = serde_json::from_str(text)
            .map_err(|e| AppError::Storage(format!("Invalid seed data: {}", e)))?;
        let now = now_timestamp();

        Ok(Self {
            categories: stamp_all(raw.categories, &now)?,
            dishes: stamp_all(raw.dishes, &now)?,
            ingredients: stamp_all(raw.ingredients, &now)?,
        })
    }
}

fn stamp_all<T: DeserializeOwned>(items: Vec<Value>, now: &str) -> Result<Vec<T>, AppError> {
    items
        .into_iter()
        .map(|mut item| {
            if let Some(object) = item.as_object_mut() {
                for key in ["createdAt", "updatedAt"] {
                    object
                        .entry(key)
                        .or_insert_with(|| Value::String(now.to_string()));
                }
            }
            serde_json::from_value(item)
                .map_err(|e| AppError::Storage(format!("Invalid seed record: {}", e)))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bundled_menu_is_consistent() {
        let seed = SeedData::bundled().unwrap();
        assert_eq!(seed.categories.len(), 6);
        assert!(seed.categories.iter().any(|c| c.id == "3"));

        for category in &seed.categories {
            assert!(category.name.is_complete(), "category {}", category.id);
        }
        for dish in &seed.dishes {
            assert!(dish.name.is_complete(), "dish {}", dish.id);
            assert!(dish.description.is_complete(), "dish {}", dish.id);
            assert!(seed.categories.iter().any(|c| c.id == dish.category));
            for ingredient_id in dish.ingredients.iter().chain(dish.customization.ingredient_ids()) {
                assert!(
                    seed.ingredients.iter().any(|i| &i.id == ingredient_id),
                    "dish {} references unknown ingredient {}",
                    dish.id,
                    ingredient_id
                );
            }
        }
    }

    #[test]
    fn test_missing_timestamps_are_filled() {
        let seed = SeedData::from_json(
            r#"{ "categories": [{ "id": "c", "name": { "en": "Mains" } }] }"#,
        )
        .unwrap();
        assert!(!seed.categories[0].created_at.is_empty());
        assert!(seed.dishes.is_empty());
    }

    #[test]
    fn test_invalid_seed_is_a_storage_error() {
        let err = SeedData::from_json("[]").unwrap_err();
        assert!(matches!(err, AppError::Storage(_)));
    }
}
