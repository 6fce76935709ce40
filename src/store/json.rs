//! Flat JSON file backend.
//!
//! The whole catalog is held in memory and the file is rewritten on every
//! write. Writers are serialized through a mutex and the file is replaced
//! atomically, so a failed write leaves both the file and memory untouched.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::Mutex;

use super::{Collection, Document, SCHEMA_VERSION};
use crate::errors::AppError;
use crate::models::{now_timestamp, RevisionInfo};

/// On-disk layout of the catalog file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MenuFile {
    #[serde(default = "default_schema_version")]
    schema_version: i32,
    #[serde(default)]
    revision_id: i64,
    #[serde(default = "now_timestamp")]
    generated_at: String,
    #[serde(default)]
    categories: Vec<Value>,
    #[serde(default)]
    dishes: Vec<Value>,
    #[serde(default)]
    ingredients: Vec<Value>,
}

fn default_schema_version() -> i32 {
    SCHEMA_VERSION
}

impl Default for MenuFile {
    fn default() -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            revision_id: 0,
            generated_at: now_timestamp(),
            categories: Vec::new(),
            dishes: Vec::new(),
            ingredients: Vec::new(),
        }
    }
}

impl MenuFile {
    fn collection(&self, collection: Collection) -> &Vec<Value> {
        match collection {
            Collection::Dishes => &self.dishes,
            Collection::Categories => &self.categories,
            Collection::Ingredients => &self.ingredients,
        }
    }

    fn collection_mut(&mut self, collection: Collection) -> &mut Vec<Value> {
        match collection {
            Collection::Dishes => &mut self.dishes,
            Collection::Categories => &mut self.categories,
            Collection::Ingredients => &mut self.ingredients,
        }
    }

    fn position(&self, collection: Collection, id: &str) -> Option<usize> {
        self.collection(collection)
            .iter()
            .position(|v| v.get("id").and_then(Value::as_str) == Some(id))
    }

    fn bump_revision(&mut self) {
        self.revision_id += 1;
        self.generated_at = now_timestamp();
    }
}

/// Catalog stored in a single JSON file.
pub struct JsonStore {
    path: PathBuf,
    state: Mutex<MenuFile>,
}

impl JsonStore {
    /// Open the file at `path`, creating an empty catalog when it does not exist.
    pub async fn open(path: &Path) -> Result<Self, AppError> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await.ok();
        }

        let file = match tokio::fs::read(path).await {
            Ok(bytes) => serde_json::from_slice::<MenuFile>(&bytes).map_err(|e| {
                AppError::Storage(format!("Corrupt catalog file {}: {}", path.display(), e))
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let file = MenuFile::default();
                write_atomically(path, &file).await?;
                tracing::info!("Created empty catalog file at {:?}", path);
                file
            }
            Err(e) => return Err(e.into()),
        };

        Ok(Self {
            path: path.to_path_buf(),
            state: Mutex::new(file),
        })
    }

    pub async fn revision_info(&self) -> Result<RevisionInfo, AppError> {
        let state = self.state.lock().await;
        Ok(RevisionInfo {
            revision_id: state.revision_id,
            generated_at: state.generated_at.clone(),
        })
    }

    pub async fn list<D: Document>(&self) -> Result<Vec<D>, AppError> {
        let state = self.state.lock().await;
        state
            .collection(D::COLLECTION)
            .iter()
            .map(|v| decode(v.clone()))
            .collect()
    }

    pub async fn get<D: Document>(&self, id: &str) -> Result<Option<D>, AppError> {
        let state = self.state.lock().await;
        match state.position(D::COLLECTION, id) {
            Some(idx) => decode(state.collection(D::COLLECTION)[idx].clone()).map(Some),
            None => Ok(None),
        }
    }

    pub async fn insert<D: Document>(&self, doc: &D) -> Result<(), AppError> {
        let value = encode(doc)?;
        let mut state = self.state.lock().await;

        if state.position(D::COLLECTION, doc.id()).is_some() {
            return Err(AppError::Storage(format!(
                "Duplicate id {} in {}",
                doc.id(),
                D::COLLECTION.name()
            )));
        }

        let mut next = state.clone();
        next.collection_mut(D::COLLECTION).push(value);
        next.bump_revision();
        write_atomically(&self.path, &next).await?;
        *state = next;
        Ok(())
    }

    pub async fn replace<D: Document>(&self, doc: &D, expected_version: i64) -> Result<bool, AppError> {
        let value = encode(doc)?;
        let mut state = self.state.lock().await;

        let Some(idx) = state.position(D::COLLECTION, doc.id()) else {
            return Ok(false);
        };
        let stored_version = state.collection(D::COLLECTION)[idx]
            .get("version")
            .and_then(Value::as_i64)
            .unwrap_or(0);
        if stored_version != expected_version {
            return Ok(false);
        }

        let mut next = state.clone();
        next.collection_mut(D::COLLECTION)[idx] = value;
        next.bump_revision();
        write_atomically(&self.path, &next).await?;
        *state = next;
        Ok(true)
    }

    pub async fn remove<D: Document>(&self, id: &str) -> Result<bool, AppError> {
        let mut state = self.state.lock().await;

        let Some(idx) = state.position(D::COLLECTION, id) else {
            return Ok(false);
        };

        let mut next = state.clone();
        next.collection_mut(D::COLLECTION).remove(idx);
        next.bump_revision();
        write_atomically(&self.path, &next).await?;
        *state = next;
        Ok(true)
    }
}

fn encode<D: Document>(doc: &D) -> Result<Value, AppError> {
    serde_json::to_value(doc)
        .map_err(|e| AppError::Storage(format!("Failed to encode {}: {}", doc.id(), e)))
}

fn decode<D: Document>(value: Value) -> Result<D, AppError> {
    serde_json::from_value(value).map_err(|e| {
        AppError::Storage(format!(
            "Corrupt document in {}: {}",
            D::COLLECTION.name(),
            e
        ))
    })
}

/// Write to a sibling temp file, then rename over the target.
async fn write_atomically(path: &Path, file: &MenuFile) -> Result<(), AppError> {
    let bytes = serde_json::to_vec_pretty(file)
        .map_err(|e| AppError::Storage(format!("Failed to serialize catalog: {}", e)))?;
    let tmp = path.with_extension("json.tmp");
    tokio::fs::write(&tmp, &bytes).await?;
    tokio::fs::rename(&tmp, path).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Category, LocalizedText};
    use tempfile::TempDir;

    fn category(id: &str) -> Category {
        Category {
            id: id.to_string(),
            name: LocalizedText::uniform("Starters"),
            description: None,
            icon: Some("🥢".to_string()),
            order: 1,
            is_active: true,
            dish_count: 0,
            created_at: now_timestamp(),
            updated_at: now_timestamp(),
            version: 1,
        }
    }

    #[tokio::test]
    async fn test_data_survives_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("menu.json");

        {
            let store = JsonStore::open(&path).await.unwrap();
            store.insert(&category("1")).await.unwrap();
        }

        let reopened = JsonStore::open(&path).await.unwrap();
        let categories: Vec<Category> = reopened.list().await.unwrap();
        assert_eq!(categories.len(), 1);
        assert_eq!(categories[0].id, "1");
        assert_eq!(reopened.revision_info().await.unwrap().revision_id, 1);
    }

    #[tokio::test]
    async fn test_replace_rejects_stale_version() {
        let dir = TempDir::new().unwrap();
        let store = JsonStore::open(&dir.path().join("menu.json")).await.unwrap();
        store.insert(&category("1")).await.unwrap();

        let mut updated = category("1");
        updated.version = 2;
        assert!(store.replace(&updated, 1).await.unwrap());
        assert!(!store.replace(&updated, 1).await.unwrap());
    }

    #[tokio::test]
    async fn test_corrupt_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("menu.json");
        tokio::fs::write(&path, b"{ not json").await.unwrap();

        let err = JsonStore::open(&path).await.err().unwrap();
        assert!(matches!(err, AppError::Storage(_)));
    }
}
