//! Tantivy-based dish search.
//!
//! Every translation of a dish's name and description is indexed, together
//! with the names of its ingredients and its category, so a customer can find
//! a dish in any menu language.

use std::path::Path;
use std::sync::Arc;
use tantivy::collector::TopDocs;
use tantivy::query::{BooleanQuery, BoostQuery, Occur, QueryParser};
use tantivy::schema::{Field, Schema, Value, STORED, STRING, TEXT};
use tantivy::{doc, Index, IndexReader, IndexWriter, ReloadPolicy, TantivyDocument};
use tokio::sync::RwLock;

use crate::errors::AppError;
use crate::models::{Category, Dish, Ingredient};

const BOOST_NAME: f32 = 10.0;
const BOOST_INGREDIENTS: f32 = 6.0;
const BOOST_CATEGORY: f32 = 4.0;
const BOOST_DESCRIPTION: f32 = 3.0;

/// Search result with dish id and relevance score.
#[derive(Debug, Clone)]
pub struct SearchResult {
    pub dish_id: String,
    pub score: f32,
}

struct SearchFields {
    dish_id: Field,
    name: Field,
    description: Field,
    ingredients: Field,
    category: Field,
}

/// Lookup tables used to expand a dish's references into searchable text.
pub struct SearchContext<'a> {
    pub categories: &'a [Category],
    pub ingredients: &'a [Ingredient],
}

pub struct SearchIndex {
    index: Index,
    reader: IndexReader,
    writer: Arc<RwLock<IndexWriter>>,
    fields: SearchFields,
}

impl SearchIndex {
    /// Create or open a search index at the specified path.
    pub fn open(index_path: &Path) -> Result<Self, AppError> {
        std::fs::create_dir_all(index_path)
            .map_err(|e| AppError::Search(format!("Failed to create index directory: {}", e)))?;

        let mut schema_builder = Schema::builder();
        let dish_id = schema_builder.add_text_field("dish_id", STRING | STORED);
        let name = schema_builder.add_text_field("name", TEXT);
        let description = schema_builder.add_text_field("description", TEXT);
        let ingredients = schema_builder.add_text_field("ingredients", TEXT);
        let category = schema_builder.add_text_field("category", TEXT);
        let schema = schema_builder.build();

        let fields = SearchFields {
            dish_id,
            name,
            description,
            ingredients,
            category,
        };

        let index = Index::open_in_dir(index_path)
            .or_else(|_| Index::create_in_dir(index_path, schema.clone()))
            .map_err(|e| AppError::Search(format!("Failed to open/create index: {}", e)))?;

        let reader = index
            .reader_builder()
            .reload_policy(ReloadPolicy::OnCommitWithDelay)
            .try_into()
            .map_err(|e| AppError::Search(format!("Failed to create reader: {}", e)))?;

        let writer = index
            .writer(50_000_000) // 50MB buffer
            .map_err(|e| AppError::Search(format!("Failed to create writer: {}", e)))?;

        Ok(Self {
            index,
            reader,
            writer: Arc::new(RwLock::new(writer)),
            fields,
        })
    }

    /// Replace the whole index with `dishes`.
    pub async fn rebuild(&self, dishes: &[Dish], ctx: &SearchContext<'_>) -> Result<(), AppError> {
        let mut writer = self.writer.write().await;

        writer.delete_all_documents()?;
        for dish in dishes {
            writer.add_document(self.create_document(dish, ctx))?;
        }
        writer.commit()?;
        self.reader.reload()?;

        tracing::info!("Search index rebuilt with {} dishes", dishes.len());
        Ok(())
    }

    /// Index a single dish, replacing any previous entry.
    pub async fn index_dish(&self, dish: &Dish, ctx: &SearchContext<'_>) -> Result<(), AppError> {
        let mut writer = self.writer.write().await;

        let term = tantivy::Term::from_field_text(self.fields.dish_id, &dish.id);
        writer.delete_term(term);
        writer.add_document(self.create_document(dish, ctx))?;
        writer.commit()?;
        self.reader.reload()?;

        Ok(())
    }

    pub async fn remove_dish(&self, dish_id: &str) -> Result<(), AppError> {
        let mut writer = self.writer.write().await;

        let term = tantivy::Term::from_field_text(self.fields.dish_id, dish_id);
        writer.delete_term(term);
        writer.commit()?;
        self.reader.reload()?;

        Ok(())
    }

    /// Search dishes, best match first.
    pub fn search(
        &self,
        query_str: &str,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<SearchResult>, AppError> {
        if query_str.trim().is_empty() {
            return Ok(Vec::new());
        }

        let searcher = self.reader.searcher();

        let query_parser = QueryParser::for_index(
            &self.index,
            vec![
                self.fields.name,
                self.fields.description,
                self.fields.ingredients,
                self.fields.category,
            ],
        );
        let base_query = query_parser
            .parse_query(query_str)
            .map_err(|e| AppError::Search(format!("Invalid search query: {}", e)))?;

        let field_queries = [
            (self.fields.name, BOOST_NAME),
            (self.fields.ingredients, BOOST_INGREDIENTS),
            (self.fields.category, BOOST_CATEGORY),
            (self.fields.description, BOOST_DESCRIPTION),
        ];

        let mut subqueries: Vec<(Occur, Box<dyn tantivy::query::Query>)> = Vec::new();
        for (field, boost) in field_queries {
            let field_parser = QueryParser::for_index(&self.index, vec![field]);
            if let Ok(field_query) = field_parser.parse_query(query_str) {
                subqueries.push((Occur::Should, Box::new(BoostQuery::new(field_query, boost))));
            }
        }

        let combined_query = if subqueries.is_empty() {
            base_query
        } else {
            Box::new(BooleanQuery::new(subqueries))
        };

        let top_docs = searcher
            .search(&combined_query, &TopDocs::with_limit(limit + offset))
            .map_err(|e| AppError::Search(format!("Search failed: {}", e)))?;

        let results = top_docs
            .into_iter()
            .skip(offset)
            .take(limit)
            .filter_map(|(score, doc_address)| {
                let doc: TantivyDocument = searcher.doc(doc_address).ok()?;
                let dish_id = doc.get_first(self.fields.dish_id)?.as_str()?.to_string();
                Some(SearchResult { dish_id, score })
            })
            .collect();

        Ok(results)
    }

    fn create_document(&self, dish: &Dish, ctx: &SearchContext<'_>) -> TantivyDocument {
        let ingredient_names: Vec<String> = ctx
            .ingredients
            .iter()
            .filter(|i| dish.references_ingredient(&i.id))
            .map(|i| i.name.joined())
            .collect();

        let category_name = ctx
            .categories
            .iter()
            .find(|c| c.id == dish.category)
            .map(|c| c.name.joined())
            .unwrap_or_default();

        doc!(
            self.fields.dish_id => dish.id.clone(),
            self.fields.name => dish.name.joined(),
            self.fields.description => dish.description.joined(),
            self.fields.ingredients => ingredient_names.join(" "),
            self.fields.category => category_name
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::menu::fixtures::{category, dish};
    use crate::models::{now_timestamp, IngredientCategory, LocalizedText};
    use tempfile::TempDir;

    fn shrimp() -> Ingredient {
        Ingredient {
            id: "i1".to_string(),
            name: LocalizedText::uniform("Shrimp"),
            description: None,
            category: IngredientCategory::Seafood,
            price: 60.0,
            allergens: Default::default(),
            is_active: true,
            created_at: now_timestamp(),
            updated_at: now_timestamp(),
            version: 1,
        }
    }

    fn fixtures() -> (Vec<Dish>, Vec<Category>, Vec<Ingredient>) {
        let mut tom_yum = dish("d1", "Tom Yum", "2", 220.0);
        tom_yum.name.ru = "Том Ям".to_string();
        tom_yum.ingredients = vec!["i1".to_string()];
        let pad_thai = dish("d2", "Pad Thai", "3", 180.0);
        (
            vec![tom_yum, pad_thai],
            vec![category("2", "Soups", 2), category("3", "Noodles", 3)],
            vec![shrimp()],
        )
    }

    #[tokio::test]
    async fn test_search_by_name_in_any_language() {
        let temp_dir = TempDir::new().unwrap();
        let index = SearchIndex::open(temp_dir.path()).unwrap();
        let (dishes, categories, ingredients) = fixtures();
        let ctx = SearchContext {
            categories: &categories,
            ingredients: &ingredients,
        };
        index.rebuild(&dishes, &ctx).await.unwrap();

        let results = index.search("pad", 10, 0).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].dish_id, "d2");

        let results = index.search("том", 10, 0).unwrap();
        assert_eq!(results[0].dish_id, "d1");
    }

    #[tokio::test]
    async fn test_search_by_ingredient_and_category() {
        let temp_dir = TempDir::new().unwrap();
        let index = SearchIndex::open(temp_dir.path()).unwrap();
        let (dishes, categories, ingredients) = fixtures();
        let ctx = SearchContext {
            categories: &categories,
            ingredients: &ingredients,
        };
        index.rebuild(&dishes, &ctx).await.unwrap();

        let results = index.search("shrimp", 10, 0).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].dish_id, "d1");

        let results = index.search("noodles", 10, 0).unwrap();
        assert_eq!(results[0].dish_id, "d2");
    }

    #[tokio::test]
    async fn test_index_and_remove_dish() {
        let temp_dir = TempDir::new().unwrap();
        let index = SearchIndex::open(temp_dir.path()).unwrap();
        let (mut dishes, categories, ingredients) = fixtures();
        let ctx = SearchContext {
            categories: &categories,
            ingredients: &ingredients,
        };
        index.rebuild(&dishes, &ctx).await.unwrap();

        dishes[1].name.en = "Khao Soi".to_string();
        index.index_dish(&dishes[1], &ctx).await.unwrap();
        assert_eq!(index.search("khao", 10, 0).unwrap().len(), 1);
        assert_eq!(index.search("soi", 10, 0).unwrap()[0].dish_id, "d2");

        index.remove_dish("d2").await.unwrap();
        assert!(index.search("khao", 10, 0).unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_search_empty_query() {
        let temp_dir = TempDir::new().unwrap();
        let index = SearchIndex::open(temp_dir.path()).unwrap();

        let results = index.search("  ", 10, 0).unwrap();
        assert!(results.is_empty());
    }
}
