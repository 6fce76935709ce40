//! Catalog snapshot used by the back office to hydrate its state.

use serde::{Deserialize, Serialize};

use super::{Category, Dish, Ingredient};

/// The full catalog at one revision.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Datastore {
    pub schema_version: i32,
    pub generated_at: String,
    pub revision_id: i64,
    pub categories: Vec<Category>,
    pub dishes: Vec<Dish>,
    pub ingredients: Vec<Ingredient>,
}

/// Revision information for change detection.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RevisionInfo {
    pub revision_id: i64,
    pub generated_at: String,
}
