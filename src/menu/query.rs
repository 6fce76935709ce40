//! Search, filter and sort for catalog listings.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::models::{Category, Dish, Ingredient, IngredientCategory, Locale, LocalizedText};

/// One-tap menu filters.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum QuickFilter {
    #[default]
    All,
    Popular,
    New,
    ChefSpecial,
    Seasonal,
    LimitedTime,
    Spicy,
    Vegetarian,
    Vegan,
}

impl QuickFilter {
    pub fn matches(&self, dish: &Dish) -> bool {
        match self {
            QuickFilter::All => true,
            QuickFilter::Popular => dish.tags.is_popular,
            QuickFilter::New => dish.tags.is_new,
            QuickFilter::ChefSpecial => dish.tags.is_chef_special,
            QuickFilter::Seasonal => dish.tags.is_seasonal,
            QuickFilter::LimitedTime => dish.tags.is_limited_time,
            QuickFilter::Spicy => dish.dietary.is_spicy,
            QuickFilter::Vegetarian => dish.dietary.is_vegetarian,
            QuickFilter::Vegan => dish.dietary.is_vegan,
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    fn apply(&self, ordering: Ordering) -> Ordering {
        match self {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum DishSort {
    #[default]
    Order,
    Name,
    Price,
    Views,
    CreatedAt,
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum CategorySort {
    #[default]
    Order,
    Name,
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum IngredientSort {
    #[default]
    Name,
    Price,
    Category,
}

/// Query string of GET /api/dishes.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct DishQuery {
    /// Substring of the name in `lang`
    pub q: Option<String>,
    pub lang: Locale,
    pub category: Option<String>,
    /// Only dishes with this active flag
    pub active: Option<bool>,
    pub filter: QuickFilter,
    pub sort: DishSort,
    pub direction: SortDirection,
}

impl DishQuery {
    pub fn apply(&self, dishes: Vec<Dish>) -> Vec<Dish> {
        let needle = normalized_needle(self.q.as_deref());
        let mut result: Vec<Dish> = dishes
            .into_iter()
            .filter(|d| name_matches(&d.name, self.lang, needle.as_deref()))
            .filter(|d| self.category.as_ref().map_or(true, |c| &d.category == c))
            .filter(|d| self.active.map_or(true, |a| d.is_active == a))
            .filter(|d| self.filter.matches(d))
            .collect();

        result.sort_by(|a, b| {
            let ordering = match self.sort {
                DishSort::Order => a.order.cmp(&b.order),
                DishSort::Name => compare_names(&a.name, &b.name, self.lang),
                DishSort::Price => a.price.amount.total_cmp(&b.price.amount),
                DishSort::Views => a.views.cmp(&b.views),
                DishSort::CreatedAt => a.created_at.cmp(&b.created_at),
            };
            self.direction.apply(ordering)
        });
        result
    }
}

/// Query string of GET /api/categories.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct CategoryQuery {
    pub q: Option<String>,
    pub lang: Locale,
    pub active: Option<bool>,
    pub sort: CategorySort,
    pub direction: SortDirection,
}

impl CategoryQuery {
    pub fn apply(&self, categories: Vec<Category>) -> Vec<Category> {
        let needle = normalized_needle(self.q.as_deref());
        let mut result: Vec<Category> = categories
            .into_iter()
            .filter(|c| name_matches(&c.name, self.lang, needle.as_deref()))
            .filter(|c| self.active.map_or(true, |a| c.is_active == a))
            .collect();

        result.sort_by(|a, b| {
            let ordering = match self.sort {
                CategorySort::Order => a.order.cmp(&b.order),
                CategorySort::Name => compare_names(&a.name, &b.name, self.lang),
            };
            self.direction.apply(ordering)
        });
        result
    }
}

/// Query string of GET /api/ingredients.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct IngredientQuery {
    pub q: Option<String>,
    pub lang: Locale,
    pub category: Option<IngredientCategory>,
    pub active: Option<bool>,
    pub sort: IngredientSort,
    pub direction: SortDirection,
}

impl IngredientQuery {
    pub fn apply(&self, ingredients: Vec<Ingredient>) -> Vec<Ingredient> {
        let needle = normalized_needle(self.q.as_deref());
        let mut result: Vec<Ingredient> = ingredients
            .into_iter()
            .filter(|i| name_matches(&i.name, self.lang, needle.as_deref()))
            .filter(|i| self.category.map_or(true, |c| i.category == c))
            .filter(|i| self.active.map_or(true, |a| i.is_active == a))
            .collect();

        result.sort_by(|a, b| {
            let ordering = match self.sort {
                IngredientSort::Name => compare_names(&a.name, &b.name, self.lang),
                IngredientSort::Price => a.price.total_cmp(&b.price),
                IngredientSort::Category => a.category.as_str().cmp(b.category.as_str()),
            };
            self.direction.apply(ordering)
        });
        result
    }
}

fn normalized_needle(q: Option<&str>) -> Option<String> {
    q.map(|s| s.trim().to_lowercase()).filter(|s| !s.is_empty())
}

fn name_matches(name: &LocalizedText, lang: Locale, needle: Option<&str>) -> bool {
    match needle {
        Some(needle) => name.get(lang).to_lowercase().contains(needle),
        None => true,
    }
}

fn compare_names(a: &LocalizedText, b: &LocalizedText, lang: Locale) -> Ordering {
    a.get(lang).to_lowercase().cmp(&b.get(lang).to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::menu::fixtures::dish;

    #[test]
    fn test_popular_filter_only_returns_popular() {
        let mut popular = dish("1", "Pad Thai", "3", 220.0);
        popular.tags.is_popular = true;
        let plain = dish("2", "Fried Rice", "3", 120.0);

        let query = DishQuery {
            filter: QuickFilter::Popular,
            ..Default::default()
        };
        let result = query.apply(vec![popular.clone(), plain.clone()]);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].id, "1");

        let all = DishQuery::default().apply(vec![popular, plain]);
        assert_eq!(all.len(), 2);
    }

    #[test]
    fn test_localized_substring_search() {
        let mut curry = dish("1", "Green Curry", "2", 200.0);
        curry.name.de = "Grünes Curry".to_string();
        let soup = dish("2", "Tom Yum", "1", 150.0);

        let query = DishQuery {
            q: Some("GRÜN".to_string()),
            lang: Locale::De,
            ..Default::default()
        };
        let result = query.apply(vec![curry, soup]);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].id, "1");
    }

    #[test]
    fn test_sort_price_desc_and_active_only() {
        let cheap = dish("1", "Spring Rolls", "1", 80.0);
        let mid = dish("2", "Larb", "1", 140.0);
        let mut hidden = dish("3", "Lobster", "1", 900.0);
        hidden.is_active = false;

        let query = DishQuery {
            active: Some(true),
            sort: DishSort::Price,
            direction: SortDirection::Desc,
            ..Default::default()
        };
        let ids: Vec<String> = query
            .apply(vec![cheap, mid, hidden])
            .into_iter()
            .map(|d| d.id)
            .collect();
        assert_eq!(ids, vec!["2", "1"]);
    }

    #[test]
    fn test_query_string_parsing() {
        let query: DishQuery =
            serde_json::from_value(serde_json::json!({ "filter": "chefSpecial", "sort": "createdAt" }))
                .unwrap();
        assert_eq!(query.filter, QuickFilter::ChefSpecial);
        assert_eq!(query.sort, DishSort::CreatedAt);
        assert_eq!(query.lang, Locale::En);
    }
}
