//! Catalog storage.
//!
//! `Catalog` is the single entry point for dishes, categories and ingredients.
//! Validation, referential integrity and record construction live here once;
//! the backends only persist documents and bump the catalog revision on every write.

mod json;
mod sqlite;

pub use json::JsonStore;
pub use sqlite::SqliteStore;

use serde::de::DeserializeOwned;
use serde::Serialize;
use sqlx::SqlitePool;
use tokio::sync::Mutex;

use crate::config::{Config, StorageKind};
use crate::errors::AppError;
use crate::menu::SeedData;
use crate::models::{
    now_timestamp, Category, CreateCategoryRequest, CreateDishRequest, CreateIngredientRequest,
    Datastore, Dish, Ingredient, LocalizedText, RevisionInfo, UpdateCategoryRequest,
    UpdateDishRequest, UpdateIngredientRequest, MAX_SPICY_LEVEL,
};

/// Version of the snapshot layout returned by `Catalog::snapshot`.
pub const SCHEMA_VERSION: i32 = 1;

/// A named set of documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collection {
    Dishes,
    Categories,
    Ingredients,
}

impl Collection {
    pub fn name(&self) -> &'static str {
        match self {
            Collection::Dishes => "dishes",
            Collection::Categories => "categories",
            Collection::Ingredients => "ingredients",
        }
    }
}

/// A record the backends can persist as a JSON document.
pub trait Document: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    const COLLECTION: Collection;

    fn id(&self) -> &str;
    fn version(&self) -> i64;
}

impl Document for Dish {
    const COLLECTION: Collection = Collection::Dishes;

    fn id(&self) -> &str {
        &self.id
    }

    fn version(&self) -> i64 {
        self.version
    }
}

impl Document for Category {
    const COLLECTION: Collection = Collection::Categories;

    fn id(&self) -> &str {
        &self.id
    }

    fn version(&self) -> i64 {
        self.version
    }
}

impl Document for Ingredient {
    const COLLECTION: Collection = Collection::Ingredients;

    fn id(&self) -> &str {
        &self.id
    }

    fn version(&self) -> i64 {
        self.version
    }
}

/// The persistence backend behind a catalog.
pub enum Backend {
    Json(JsonStore),
    Sqlite(SqliteStore),
}

impl Backend {
    pub fn name(&self) -> &'static str {
        match self {
            Backend::Json(_) => StorageKind::Json.as_str(),
            Backend::Sqlite(_) => StorageKind::Sqlite.as_str(),
        }
    }

    async fn revision_info(&self) -> Result<RevisionInfo, AppError> {
        match self {
            Backend::Json(s) => s.revision_info().await,
            Backend::Sqlite(s) => s.revision_info().await,
        }
    }

    async fn list<D: Document>(&self) -> Result<Vec<D>, AppError> {
        match self {
            Backend::Json(s) => s.list().await,
            Backend::Sqlite(s) => s.list().await,
        }
    }

    async fn get<D: Document>(&self, id: &str) -> Result<Option<D>, AppError> {
        match self {
            Backend::Json(s) => s.get(id).await,
            Backend::Sqlite(s) => s.get(id).await,
        }
    }

    async fn insert<D: Document>(&self, doc: &D) -> Result<(), AppError> {
        match self {
            Backend::Json(s) => s.insert(doc).await,
            Backend::Sqlite(s) => s.insert(doc).await,
        }
    }

    /// Returns false when the stored version is no longer `expected_version`.
    async fn replace<D: Document>(&self, doc: &D, expected_version: i64) -> Result<bool, AppError> {
        match self {
            Backend::Json(s) => s.replace(doc, expected_version).await,
            Backend::Sqlite(s) => s.replace(doc, expected_version).await,
        }
    }

    /// Returns false when nothing was stored under `id`.
    async fn remove<D: Document>(&self, id: &str) -> Result<bool, AppError> {
        match self {
            Backend::Json(s) => s.remove::<D>(id).await,
            Backend::Sqlite(s) => s.remove::<D>(id).await,
        }
    }
}

/// Catalog of dishes, categories and ingredients.
pub struct Catalog {
    backend: Backend,
    /// Serializes writes so integrity checks and the write they guard are atomic.
    write_lock: Mutex<()>,
}

impl Catalog {
    pub fn new(backend: Backend) -> Self {
        Self {
            backend,
            write_lock: Mutex::new(()),
        }
    }

    /// Open the backend selected by the configuration.
    pub async fn open(config: &Config, pool: &SqlitePool) -> Result<Self, AppError> {
        let backend = match config.storage {
            StorageKind::Json => Backend::Json(JsonStore::open(&config.json_path).await?),
            StorageKind::Sqlite => Backend::Sqlite(SqliteStore::new(pool.clone())),
        };
        Ok(Self::new(backend))
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    pub async fn revision_info(&self) -> Result<RevisionInfo, AppError> {
        self.backend.revision_info().await
    }

    pub async fn revision_id(&self) -> Result<i64, AppError> {
        Ok(self.revision_info().await?.revision_id)
    }

    /// The whole catalog at its current revision.
    pub async fn snapshot(&self) -> Result<Datastore, AppError> {
        let revision = self.revision_info().await?;
        Ok(Datastore {
            schema_version: SCHEMA_VERSION,
            generated_at: revision.generated_at,
            revision_id: revision.revision_id,
            categories: self.list_categories().await?,
            dishes: self.list_dishes().await?,
            ingredients: self.list_ingredients().await?,
        })
    }

    /// Insert the bundled menu when the catalog holds no categories and no dishes.
    pub async fn seed_if_empty(&self, seed: SeedData) -> Result<bool, AppError> {
        let _guard = self.write_lock.lock().await;

        let categories: Vec<Category> = self.backend.list().await?;
        let dishes: Vec<Dish> = self.backend.list().await?;
        if !categories.is_empty() || !dishes.is_empty() {
            return Ok(false);
        }

        let now = now_timestamp();
        for mut category in seed.categories {
            category.created_at = now.clone();
            category.updated_at = now.clone();
            category.dish_count = 0;
            category.version = 1;
            self.backend.insert(&category).await?;
        }
        for mut ingredient in seed.ingredients {
            ingredient.created_at = now.clone();
            ingredient.updated_at = now.clone();
            ingredient.version = 1;
            self.backend.insert(&ingredient).await?;
        }
        for mut dish in seed.dishes {
            dish.created_at = now.clone();
            dish.updated_at = now.clone();
            dish.version = 1;
            self.backend.insert(&dish).await?;
        }

        Ok(true)
    }

    // ==================== DISH OPERATIONS ====================

    /// All dishes in display order.
    pub async fn list_dishes(&self) -> Result<Vec<Dish>, AppError> {
        let mut dishes: Vec<Dish> = self.backend.list().await?;
        dishes.sort_by_key(|d| d.order);
        Ok(dishes)
    }

    pub async fn get_dish(&self, id: &str) -> Result<Option<Dish>, AppError> {
        self.backend.get(id).await
    }

    pub async fn create_dish(&self, request: &CreateDishRequest) -> Result<Dish, AppError> {
        let _guard = self.write_lock.lock().await;
        let now = now_timestamp();

        let dish = Dish {
            id: uuid::Uuid::new_v4().to_string(),
            name: request.name.clone(),
            description: request.description.clone(),
            category: request.category.trim().to_string(),
            price: request.price.clone(),
            images: request.images.clone(),
            ingredients: request.ingredients.clone(),
            tags: request.tags,
            dietary: request.dietary,
            allergens: request.allergens,
            customization: request.customization.clone(),
            is_active: request.is_active,
            views: 0,
            order: request.order,
            created_at: now.clone(),
            updated_at: now,
            version: 1,
        };

        self.validate_dish(&dish).await?;
        self.backend.insert(&dish).await?;
        tracing::debug!("Created dish {}", dish.id);
        Ok(dish)
    }

    pub async fn update_dish(&self, id: &str, request: &UpdateDishRequest) -> Result<Dish, AppError> {
        let _guard = self.write_lock.lock().await;
        let existing = self.require_dish(id).await?;
        check_expected_version(existing.version, request.expected_version)?;

        let dish = Dish {
            name: request.name.clone().unwrap_or_else(|| existing.name.clone()),
            description: request
                .description
                .clone()
                .unwrap_or_else(|| existing.description.clone()),
            category: request
                .category
                .as_ref()
                .map(|c| c.trim().to_string())
                .unwrap_or_else(|| existing.category.clone()),
            price: request.price.clone().unwrap_or_else(|| existing.price.clone()),
            images: request.images.clone().unwrap_or_else(|| existing.images.clone()),
            ingredients: request
                .ingredients
                .clone()
                .unwrap_or_else(|| existing.ingredients.clone()),
            tags: request.tags.unwrap_or(existing.tags),
            dietary: request.dietary.unwrap_or(existing.dietary),
            allergens: request.allergens.unwrap_or(existing.allergens),
            customization: request
                .customization
                .clone()
                .unwrap_or_else(|| existing.customization.clone()),
            is_active: request.is_active.unwrap_or(existing.is_active),
            order: request.order.unwrap_or(existing.order),
            updated_at: now_timestamp(),
            version: existing.version + 1,
            ..existing.clone()
        };

        self.validate_dish(&dish).await?;
        self.replace_checked(&dish, existing.version).await?;
        Ok(dish)
    }

    /// Flip `isActive`, leaving every other field untouched. Reactivating a
    /// dish whose category or ingredients were deleted meanwhile is rejected.
    pub async fn toggle_dish_active(&self, id: &str) -> Result<Dish, AppError> {
        let _guard = self.write_lock.lock().await;
        let existing = self.require_dish(id).await?;
        if !existing.is_active {
            self.validate_dish_references(&existing).await?;
        }

        let dish = Dish {
            is_active: !existing.is_active,
            updated_at: now_timestamp(),
            version: existing.version + 1,
            ..existing.clone()
        };

        self.replace_checked(&dish, existing.version).await?;
        Ok(dish)
    }

    pub async fn delete_dish(&self, id: &str) -> Result<(), AppError> {
        let _guard = self.write_lock.lock().await;
        if !self.backend.remove::<Dish>(id).await? {
            return Err(AppError::NotFound(format!("Dish {} not found", id)));
        }
        Ok(())
    }

    /// Increment the view counter. Returns false when the dish does not exist.
    pub async fn record_dish_view(&self, id: &str) -> Result<bool, AppError> {
        let _guard = self.write_lock.lock().await;
        let Some(existing) = self.backend.get::<Dish>(id).await? else {
            return Ok(false);
        };

        // Views are not an edit, so the version stays put
        let dish = Dish {
            views: existing.views + 1,
            ..existing.clone()
        };
        self.replace_checked(&dish, existing.version).await?;
        Ok(true)
    }

    async fn require_dish(&self, id: &str) -> Result<Dish, AppError> {
        self.backend
            .get(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Dish {} not found", id)))
    }

    async fn validate_dish(&self, dish: &Dish) -> Result<(), AppError> {
        dish.name.require_complete("name").map_err(AppError::Validation)?;
        dish.description
            .require_complete("description")
            .map_err(AppError::Validation)?;

        if !dish.price.amount.is_finite() || dish.price.amount < 0.0 {
            return Err(AppError::Validation(
                "price.amount must be a non-negative number".to_string(),
            ));
        }
        if dish.price.currency.trim().is_empty() {
            return Err(AppError::Validation("price.currency is required".to_string()));
        }
        if dish.dietary.spicy_level > MAX_SPICY_LEVEL {
            return Err(AppError::Validation(format!(
                "dietary.spicyLevel must be between 0 and {}",
                MAX_SPICY_LEVEL
            )));
        }

        self.validate_dish_references(dish).await
    }

    /// The dish's category and every ingredient it names must exist.
    async fn validate_dish_references(&self, dish: &Dish) -> Result<(), AppError> {
        if dish.category.is_empty() {
            return Err(AppError::Validation("category is required".to_string()));
        }
        if self.backend.get::<Category>(&dish.category).await?.is_none() {
            return Err(AppError::Validation(format!(
                "Category {} does not exist",
                dish.category
            )));
        }

        let ingredients: Vec<Ingredient> = self.backend.list().await?;
        let unknown: Vec<&str> = dish
            .ingredients
            .iter()
            .chain(dish.customization.ingredient_ids())
            .filter(|id| !ingredients.iter().any(|i| &i.id == *id))
            .map(|id| id.as_str())
            .collect();
        if !unknown.is_empty() {
            return Err(AppError::Validation(format!(
                "Unknown ingredients: {}",
                unknown.join(", ")
            )));
        }

        Ok(())
    }

    // ==================== CATEGORY OPERATIONS ====================

    /// All categories in display order, with `dishCount` derived from active dishes.
    pub async fn list_categories(&self) -> Result<Vec<Category>, AppError> {
        let mut categories: Vec<Category> = self.backend.list().await?;
        let dishes: Vec<Dish> = self.backend.list().await?;
        for category in &mut categories {
            category.dish_count = count_active_in_category(&dishes, &category.id);
        }
        categories.sort_by_key(|c| c.order);
        Ok(categories)
    }

    pub async fn get_category(&self, id: &str) -> Result<Option<Category>, AppError> {
        let Some(mut category) = self.backend.get::<Category>(id).await? else {
            return Ok(None);
        };
        let dishes: Vec<Dish> = self.backend.list().await?;
        category.dish_count = count_active_in_category(&dishes, &category.id);
        Ok(Some(category))
    }

    pub async fn create_category(
        &self,
        request: &CreateCategoryRequest,
    ) -> Result<Category, AppError> {
        let _guard = self.write_lock.lock().await;
        let now = now_timestamp();

        let category = Category {
            id: uuid::Uuid::new_v4().to_string(),
            name: request.name.clone(),
            description: request.description.clone(),
            icon: request.icon.clone(),
            order: request.order,
            is_active: request.is_active,
            dish_count: 0,
            created_at: now.clone(),
            updated_at: now,
            version: 1,
        };

        validate_names(&category.name, category.description.as_ref())?;
        self.backend.insert(&category).await?;
        Ok(category)
    }

    pub async fn update_category(
        &self,
        id: &str,
        request: &UpdateCategoryRequest,
    ) -> Result<Category, AppError> {
        let _guard = self.write_lock.lock().await;
        let existing = self.require_category(id).await?;
        check_expected_version(existing.version, request.expected_version)?;

        let category = Category {
            name: request.name.clone().unwrap_or_else(|| existing.name.clone()),
            description: request.description.clone().or(existing.description.clone()),
            icon: request.icon.clone().or(existing.icon.clone()),
            order: request.order.unwrap_or(existing.order),
            is_active: request.is_active.unwrap_or(existing.is_active),
            dish_count: 0,
            updated_at: now_timestamp(),
            version: existing.version + 1,
            ..existing.clone()
        };

        validate_names(&category.name, category.description.as_ref())?;
        self.replace_checked(&category, existing.version).await?;
        self.with_dish_count(category).await
    }

    pub async fn toggle_category_active(&self, id: &str) -> Result<Category, AppError> {
        let _guard = self.write_lock.lock().await;
        let existing = self.require_category(id).await?;

        let category = Category {
            is_active: !existing.is_active,
            dish_count: 0,
            updated_at: now_timestamp(),
            version: existing.version + 1,
            ..existing.clone()
        };

        self.replace_checked(&category, existing.version).await?;
        self.with_dish_count(category).await
    }

    /// Delete a category. Fails while any active dish still references it.
    pub async fn delete_category(&self, id: &str) -> Result<(), AppError> {
        let _guard = self.write_lock.lock().await;
        self.require_category(id).await?;

        let dishes: Vec<Dish> = self.backend.list().await?;
        let in_use = count_active_in_category(&dishes, id);
        if in_use > 0 {
            return Err(AppError::Integrity(format!(
                "Category {} is used by {} active dish(es)",
                id, in_use
            )));
        }

        if !self.backend.remove::<Category>(id).await? {
            return Err(AppError::NotFound(format!("Category {} not found", id)));
        }
        Ok(())
    }

    async fn require_category(&self, id: &str) -> Result<Category, AppError> {
        self.backend
            .get(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Category {} not found", id)))
    }

    async fn with_dish_count(&self, mut category: Category) -> Result<Category, AppError> {
        let dishes: Vec<Dish> = self.backend.list().await?;
        category.dish_count = count_active_in_category(&dishes, &category.id);
        Ok(category)
    }

    // ==================== INGREDIENT OPERATIONS ====================

    pub async fn list_ingredients(&self) -> Result<Vec<Ingredient>, AppError> {
        self.backend.list().await
    }

    pub async fn get_ingredient(&self, id: &str) -> Result<Option<Ingredient>, AppError> {
        self.backend.get(id).await
    }

    pub async fn create_ingredient(
        &self,
        request: &CreateIngredientRequest,
    ) -> Result<Ingredient, AppError> {
        let _guard = self.write_lock.lock().await;
        let now = now_timestamp();

        let ingredient = Ingredient {
            id: uuid::Uuid::new_v4().to_string(),
            name: request.name.clone(),
            description: request.description.clone(),
            category: request.category,
            price: request.price,
            allergens: request.allergens,
            is_active: request.is_active,
            created_at: now.clone(),
            updated_at: now,
            version: 1,
        };

        validate_ingredient(&ingredient)?;
        self.backend.insert(&ingredient).await?;
        Ok(ingredient)
    }

    pub async fn update_ingredient(
        &self,
        id: &str,
        request: &UpdateIngredientRequest,
    ) -> Result<Ingredient, AppError> {
        let _guard = self.write_lock.lock().await;
        let existing = self.require_ingredient(id).await?;
        check_expected_version(existing.version, request.expected_version)?;

        let ingredient = Ingredient {
            name: request.name.clone().unwrap_or_else(|| existing.name.clone()),
            description: request.description.clone().or(existing.description.clone()),
            category: request.category.unwrap_or(existing.category),
            price: request.price.unwrap_or(existing.price),
            allergens: request.allergens.unwrap_or(existing.allergens),
            is_active: request.is_active.unwrap_or(existing.is_active),
            updated_at: now_timestamp(),
            version: existing.version + 1,
            ..existing.clone()
        };

        validate_ingredient(&ingredient)?;
        self.replace_checked(&ingredient, existing.version).await?;
        Ok(ingredient)
    }

    pub async fn toggle_ingredient_active(&self, id: &str) -> Result<Ingredient, AppError> {
        let _guard = self.write_lock.lock().await;
        let existing = self.require_ingredient(id).await?;

        let ingredient = Ingredient {
            is_active: !existing.is_active,
            updated_at: now_timestamp(),
            version: existing.version + 1,
            ..existing.clone()
        };

        self.replace_checked(&ingredient, existing.version).await?;
        Ok(ingredient)
    }

    /// Delete an ingredient. Fails while any active dish still uses it.
    pub async fn delete_ingredient(&self, id: &str) -> Result<(), AppError> {
        let _guard = self.write_lock.lock().await;
        self.require_ingredient(id).await?;

        let dishes: Vec<Dish> = self.backend.list().await?;
        let in_use = dishes
            .iter()
            .filter(|d| d.is_active && d.references_ingredient(id))
            .count();
        if in_use > 0 {
            return Err(AppError::Integrity(format!(
                "Ingredient {} is used by {} active dish(es)",
                id, in_use
            )));
        }

        if !self.backend.remove::<Ingredient>(id).await? {
            return Err(AppError::NotFound(format!("Ingredient {} not found", id)));
        }
        Ok(())
    }

    async fn require_ingredient(&self, id: &str) -> Result<Ingredient, AppError> {
        self.backend
            .get(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Ingredient {} not found", id)))
    }

    async fn replace_checked<D: Document>(
        &self,
        doc: &D,
        expected_version: i64,
    ) -> Result<(), AppError> {
        if self.backend.replace(doc, expected_version).await? {
            return Ok(());
        }

        // Version changed between read and write
        let current = self.backend.get::<D>(doc.id()).await?;
        Err(AppError::Conflict {
            message: "Concurrent modification detected".to_string(),
            current_version: current.map(|d| d.version()).unwrap_or(0),
        })
    }
}

fn count_active_in_category(dishes: &[Dish], category_id: &str) -> usize {
    dishes
        .iter()
        .filter(|d| d.is_active && d.category == category_id)
        .count()
}

fn check_expected_version(current: i64, expected: Option<i64>) -> Result<(), AppError> {
    match expected {
        Some(expected) if expected != current => Err(AppError::Conflict {
            message: format!(
                "Version mismatch: expected {}, current {}",
                expected, current
            ),
            current_version: current,
        }),
        _ => Ok(()),
    }
}

fn validate_names(name: &LocalizedText, description: Option<&LocalizedText>) -> Result<(), AppError> {
    name.require_complete("name").map_err(AppError::Validation)?;
    if let Some(description) = description {
        description
            .require_complete("description")
            .map_err(AppError::Validation)?;
    }
    Ok(())
}

fn validate_ingredient(ingredient: &Ingredient) -> Result<(), AppError> {
    validate_names(&ingredient.name, ingredient.description.as_ref())?;
    if !ingredient.price.is_finite() || ingredient.price < 0.0 {
        return Err(AppError::Validation(
            "price must be a non-negative number".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::models::{DishTags, Price};
    use tempfile::TempDir;

    pub(crate) fn category_request(name: &str, order: i32) -> CreateCategoryRequest {
        CreateCategoryRequest {
            name: LocalizedText::uniform(name),
            description: None,
            icon: None,
            order,
            is_active: true,
        }
    }

    pub(crate) fn dish_request(name: &str, category: &str, amount: f64) -> CreateDishRequest {
        CreateDishRequest {
            name: LocalizedText::uniform(name),
            description: LocalizedText::uniform(&format!("{} description", name)),
            category: category.to_string(),
            price: Price {
                amount,
                currency: "THB".to_string(),
            },
            images: Vec::new(),
            ingredients: Vec::new(),
            tags: DishTags::default(),
            dietary: Default::default(),
            allergens: Default::default(),
            customization: Default::default(),
            is_active: true,
            order: 0,
        }
    }

    async fn json_catalog(dir: &TempDir) -> Catalog {
        let store = JsonStore::open(&dir.path().join("menu.json")).await.unwrap();
        Catalog::new(Backend::Json(store))
    }

    async fn sqlite_catalog(dir: &TempDir) -> Catalog {
        let pool = crate::db::init_database(&dir.path().join("menu.sqlite"))
            .await
            .unwrap();
        Catalog::new(Backend::Sqlite(SqliteStore::new(pool)))
    }

    async fn both_catalogs(dir: &TempDir) -> Vec<Catalog> {
        vec![json_catalog(dir).await, sqlite_catalog(dir).await]
    }

    #[tokio::test]
    async fn test_dish_requires_all_locales() {
        let dir = TempDir::new().unwrap();
        for catalog in both_catalogs(&dir).await {
            let category = catalog
                .create_category(&category_request("Soups", 1))
                .await
                .unwrap();
            let mut request = dish_request("Tom Yum", &category.id, 180.0);
            request.description.ru = String::new();

            let err = catalog.create_dish(&request).await.unwrap_err();
            assert!(matches!(err, AppError::Validation(_)), "{}", catalog.backend_name());
            assert!(catalog.list_dishes().await.unwrap().is_empty());
        }
    }

    #[tokio::test]
    async fn test_dish_requires_existing_category() {
        let dir = TempDir::new().unwrap();
        for catalog in both_catalogs(&dir).await {
            let err = catalog
                .create_dish(&dish_request("Orphan", "missing", 10.0))
                .await
                .unwrap_err();
            assert!(matches!(err, AppError::Validation(_)));
        }
    }

    #[tokio::test]
    async fn test_toggle_active_keeps_other_fields() {
        let dir = TempDir::new().unwrap();
        for catalog in both_catalogs(&dir).await {
            let category = catalog
                .create_category(&category_request("Curries", 2))
                .await
                .unwrap();
            let mut request = dish_request("Green Curry", &category.id, 220.0);
            request.tags.is_popular = true;
            request.dietary.is_spicy = true;
            request.dietary.spicy_level = 3;
            let created = catalog.create_dish(&request).await.unwrap();

            let toggled = catalog.toggle_dish_active(&created.id).await.unwrap();
            assert!(!toggled.is_active);

            let stored = catalog.get_dish(&created.id).await.unwrap().unwrap();
            let normalized = Dish {
                is_active: created.is_active,
                updated_at: created.updated_at.clone(),
                version: created.version,
                ..stored
            };
            assert_eq!(normalized, created);
        }
    }

    #[tokio::test]
    async fn test_category_delete_blocked_by_active_dish() {
        let dir = TempDir::new().unwrap();
        for catalog in both_catalogs(&dir).await {
            let category = catalog
                .create_category(&category_request("Grill", 3))
                .await
                .unwrap();
            let dish = catalog
                .create_dish(&dish_request("Satay", &category.id, 150.0))
                .await
                .unwrap();
            let revision_before = catalog.revision_id().await.unwrap();

            let err = catalog.delete_category(&category.id).await.unwrap_err();
            assert!(matches!(err, AppError::Integrity(_)));
            assert_eq!(err.status_code(), axum::http::StatusCode::BAD_REQUEST);

            let unchanged = catalog.get_category(&category.id).await.unwrap().unwrap();
            assert_eq!(unchanged.version, category.version);
            assert_eq!(unchanged.dish_count, 1);
            assert_eq!(catalog.revision_id().await.unwrap(), revision_before);

            // Once the dish is inactive the category may go
            catalog.toggle_dish_active(&dish.id).await.unwrap();
            catalog.delete_category(&category.id).await.unwrap();
            assert!(catalog.get_category(&category.id).await.unwrap().is_none());
        }
    }

    #[tokio::test]
    async fn test_reactivation_requires_existing_references() {
        let dir = TempDir::new().unwrap();
        for catalog in both_catalogs(&dir).await {
            let category = catalog
                .create_category(&category_request("Seasonal", 4))
                .await
                .unwrap();
            let basil = catalog
                .create_ingredient(&CreateIngredientRequest {
                    name: LocalizedText::uniform("Thai basil"),
                    description: None,
                    category: crate::models::IngredientCategory::Herb,
                    price: 10.0,
                    allergens: Default::default(),
                    is_active: true,
                })
                .await
                .unwrap();

            // Dish parked on a category that is then deleted
            let parked = catalog
                .create_dish(&dish_request("Pumpkin Curry", &category.id, 190.0))
                .await
                .unwrap();
            catalog.toggle_dish_active(&parked.id).await.unwrap();
            catalog.delete_category(&category.id).await.unwrap();

            let err = catalog.toggle_dish_active(&parked.id).await.unwrap_err();
            assert!(matches!(err, AppError::Validation(_)), "{}", catalog.backend_name());
            let stored = catalog.get_dish(&parked.id).await.unwrap().unwrap();
            assert!(!stored.is_active);

            // Dish parked on an ingredient that is then deleted
            let other = catalog
                .create_category(&category_request("Mains", 1))
                .await
                .unwrap();
            let mut request = dish_request("Kra Pao", &other.id, 120.0);
            request.ingredients = vec![basil.id.clone()];
            let herbal = catalog.create_dish(&request).await.unwrap();
            catalog.toggle_dish_active(&herbal.id).await.unwrap();
            catalog.delete_ingredient(&basil.id).await.unwrap();

            let err = catalog.toggle_dish_active(&herbal.id).await.unwrap_err();
            assert!(matches!(err, AppError::Validation(_)), "{}", catalog.backend_name());

            // Deactivating never needs the references
            let plain = catalog
                .create_dish(&dish_request("Sticky Rice", &other.id, 40.0))
                .await
                .unwrap();
            assert!(!catalog.toggle_dish_active(&plain.id).await.unwrap().is_active);
            assert!(catalog.toggle_dish_active(&plain.id).await.unwrap().is_active);
        }
    }

    #[tokio::test]
    async fn test_views_do_not_bump_version() {
        let dir = TempDir::new().unwrap();
        for catalog in both_catalogs(&dir).await {
            let category = catalog
                .create_category(&category_request("Soups", 2))
                .await
                .unwrap();
            let dish = catalog
                .create_dish(&dish_request("Tom Kha", &category.id, 170.0))
                .await
                .unwrap();

            assert!(catalog.record_dish_view(&dish.id).await.unwrap());
            assert!(catalog.record_dish_view(&dish.id).await.unwrap());
            assert!(!catalog.record_dish_view("missing").await.unwrap());

            let viewed = catalog.get_dish(&dish.id).await.unwrap().unwrap();
            assert_eq!(viewed.views, 2);
            assert_eq!(viewed.version, dish.version);

            // An edit based on the version read before the views still applies
            let updated = catalog
                .update_dish(
                    &dish.id,
                    &UpdateDishRequest {
                        order: Some(7),
                        expected_version: Some(dish.version),
                        ..Default::default()
                    },
                )
                .await
                .unwrap();
            assert_eq!(updated.order, 7);
            assert_eq!(updated.views, 2);
            assert_eq!(updated.version, dish.version + 1);
        }
    }

    #[tokio::test]
    async fn test_ingredient_delete_blocked_by_active_dish() {
        let dir = TempDir::new().unwrap();
        for catalog in both_catalogs(&dir).await {
            let category = catalog
                .create_category(&category_request("Noodles", 1))
                .await
                .unwrap();
            let peanut = catalog
                .create_ingredient(&CreateIngredientRequest {
                    name: LocalizedText::uniform("Peanuts"),
                    description: None,
                    category: crate::models::IngredientCategory::Side,
                    price: 20.0,
                    allergens: Default::default(),
                    is_active: true,
                })
                .await
                .unwrap();
            let mut request = dish_request("Pad Thai", &category.id, 160.0);
            request.customization.has_extras = true;
            request.customization.extras = vec![peanut.id.clone()];
            catalog.create_dish(&request).await.unwrap();

            let err = catalog.delete_ingredient(&peanut.id).await.unwrap_err();
            assert!(matches!(err, AppError::Integrity(_)));
        }
    }

    #[tokio::test]
    async fn test_update_version_mismatch() {
        let dir = TempDir::new().unwrap();
        for catalog in both_catalogs(&dir).await {
            let category = catalog
                .create_category(&category_request("Desserts", 5))
                .await
                .unwrap();
            let err = catalog
                .update_category(
                    &category.id,
                    &UpdateCategoryRequest {
                        order: Some(9),
                        expected_version: Some(42),
                        ..Default::default()
                    },
                )
                .await
                .unwrap_err();
            match err {
                AppError::Conflict {
                    current_version, ..
                } => assert_eq!(current_version, 1),
                other => panic!("unexpected error {:?}", other),
            }
        }
    }

    #[tokio::test]
    async fn test_revision_bumps_on_writes() {
        let dir = TempDir::new().unwrap();
        for catalog in both_catalogs(&dir).await {
            let start = catalog.revision_id().await.unwrap();
            let category = catalog
                .create_category(&category_request("Drinks", 6))
                .await
                .unwrap();
            catalog
                .update_category(
                    &category.id,
                    &UpdateCategoryRequest {
                        icon: Some("🍹".to_string()),
                        ..Default::default()
                    },
                )
                .await
                .unwrap();
            catalog.delete_category(&category.id).await.unwrap();
            assert_eq!(catalog.revision_id().await.unwrap(), start + 3);
        }
    }

    #[tokio::test]
    async fn test_seed_only_when_empty() {
        let dir = TempDir::new().unwrap();
        for catalog in both_catalogs(&dir).await {
            let seed = SeedData::bundled().unwrap();
            let expected_dishes = seed.dishes.len();
            assert!(catalog.seed_if_empty(seed).await.unwrap());
            assert_eq!(catalog.list_dishes().await.unwrap().len(), expected_dishes);

            let again = SeedData::bundled().unwrap();
            assert!(!catalog.seed_if_empty(again).await.unwrap());
            assert_eq!(catalog.list_dishes().await.unwrap().len(), expected_dishes);
        }
    }
}
