//! Customer menu navigation.
//!
//! The browser moves between three views, `categories -> dishes -> details`.
//! A quick filter jumps straight to a filtered dish list from any view and
//! stays in place until `back_to_categories`.
//! Inactive categories and dishes, and dishes whose category is inactive,
//! are never visible.

use serde::Serialize;

use crate::errors::AppError;
use crate::models::{Category, Dish};

use super::QuickFilter;

/// What the customer is looking at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum MenuView {
    Categories,
    Dishes { category_id: String },
    Filtered { filter: QuickFilter },
    Details { dish_id: String },
}

pub struct MenuBrowser {
    categories: Vec<Category>,
    dishes: Vec<Dish>,
    /// Views below the current one, oldest first
    history: Vec<MenuView>,
    current: MenuView,
}

impl MenuBrowser {
    pub fn new(categories: Vec<Category>, dishes: Vec<Dish>) -> Self {
        let mut categories: Vec<Category> = categories.into_iter().filter(|c| c.is_active).collect();
        categories.sort_by_key(|c| c.order);

        let mut dishes: Vec<Dish> = dishes
            .into_iter()
            .filter(|d| d.is_active && categories.iter().any(|c| c.id == d.category))
            .collect();
        dishes.sort_by_key(|d| d.order);

        Self {
            categories,
            dishes,
            history: Vec::new(),
            current: MenuView::Categories,
        }
    }

    pub fn view(&self) -> &MenuView {
        &self.current
    }

    /// Active categories in display order.
    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    pub fn select_category(&mut self, category_id: &str) -> Result<(), AppError> {
        if !self.categories.iter().any(|c| c.id == category_id) {
            return Err(AppError::NotFound(format!("Category {} not found", category_id)));
        }
        self.push(MenuView::Dishes {
            category_id: category_id.to_string(),
        });
        Ok(())
    }

    pub fn select_dish(&mut self, dish_id: &str) -> Result<(), AppError> {
        if !self.dishes.iter().any(|d| d.id == dish_id) {
            return Err(AppError::NotFound(format!("Dish {} not found", dish_id)));
        }
        self.push(MenuView::Details {
            dish_id: dish_id.to_string(),
        });
        Ok(())
    }

    /// Jump to the dish list for `filter`, discarding the navigation history.
    /// `QuickFilter::All` returns to the category list.
    pub fn apply_filter(&mut self, filter: QuickFilter) {
        self.history.clear();
        self.current = match filter {
            QuickFilter::All => MenuView::Categories,
            filter => MenuView::Filtered { filter },
        };
    }

    /// Pop one level. Returns false when already at the category list.
    pub fn back(&mut self) -> bool {
        if self.current == MenuView::Categories {
            return false;
        }
        self.current = self.history.pop().unwrap_or(MenuView::Categories);
        true
    }

    pub fn back_to_categories(&mut self) {
        self.history.clear();
        self.current = MenuView::Categories;
    }

    /// The dish list of the current view. On the details view this is the
    /// list the dish was opened from.
    pub fn visible_dishes(&self) -> Vec<&Dish> {
        let list_view = match &self.current {
            MenuView::Details { .. } => self.history.last().unwrap_or(&MenuView::Categories),
            view => view,
        };
        match list_view {
            MenuView::Categories | MenuView::Details { .. } => Vec::new(),
            MenuView::Dishes { category_id } => self
                .dishes
                .iter()
                .filter(|d| &d.category == category_id)
                .collect(),
            MenuView::Filtered { filter } => self.dishes.iter().filter(|d| filter.matches(d)).collect(),
        }
    }

    /// Active dishes of `category_id` that pass `filter`.
    pub fn dishes_in(&self, category_id: &str, filter: QuickFilter) -> Vec<&Dish> {
        self.dishes
            .iter()
            .filter(|d| d.category == category_id && filter.matches(d))
            .collect()
    }

    pub fn selected_dish(&self) -> Option<&Dish> {
        match &self.current {
            MenuView::Details { dish_id } => self.dishes.iter().find(|d| &d.id == dish_id),
            _ => None,
        }
    }

    fn push(&mut self, next: MenuView) {
        let previous = std::mem::replace(&mut self.current, next);
        self.history.push(previous);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::menu::fixtures::{category, dish};

    fn browser() -> MenuBrowser {
        let mut hidden_category = category("9", "Hidden", 0);
        hidden_category.is_active = false;

        let mut popular = dish("d1", "Pad Thai", "3", 180.0);
        popular.tags.is_popular = true;
        let mut spicy = dish("d2", "Tom Yum", "2", 220.0);
        spicy.dietary.is_spicy = true;
        spicy.tags.is_popular = true;
        let mut inactive = dish("d3", "Old Special", "3", 90.0);
        inactive.is_active = false;
        inactive.tags.is_popular = true;
        let mut orphan = dish("d4", "Secret", "9", 50.0);
        orphan.tags.is_popular = true;

        MenuBrowser::new(
            vec![category("3", "Noodles", 3), category("2", "Soups", 2), hidden_category],
            vec![popular, spicy, inactive, orphan],
        )
    }

    #[test]
    fn test_only_active_categories_in_order() {
        let browser = browser();
        let ids: Vec<&str> = browser.categories().iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["2", "3"]);
        assert!(browser.visible_dishes().is_empty());
    }

    #[test]
    fn test_back_pops_one_level() {
        let mut browser = browser();
        browser.select_category("3").unwrap();
        browser.select_dish("d1").unwrap();
        assert_eq!(browser.selected_dish().unwrap().id, "d1");
        assert_eq!(browser.visible_dishes().len(), 1);

        assert!(browser.back());
        assert_eq!(
            browser.view(),
            &MenuView::Dishes {
                category_id: "3".to_string()
            }
        );
        assert!(browser.back());
        assert_eq!(browser.view(), &MenuView::Categories);
        assert!(!browser.back());
    }

    #[test]
    fn test_filter_short_circuits_from_details() {
        let mut browser = browser();
        browser.select_category("2").unwrap();
        browser.select_dish("d2").unwrap();

        browser.apply_filter(QuickFilter::Popular);
        let ids: Vec<&str> = browser.visible_dishes().iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["d1", "d2"]);

        browser.select_dish("d1").unwrap();
        assert!(browser.back());
        assert_eq!(
            browser.view(),
            &MenuView::Filtered {
                filter: QuickFilter::Popular
            }
        );

        browser.back_to_categories();
        assert_eq!(browser.view(), &MenuView::Categories);
    }

    #[test]
    fn test_hidden_items_cannot_be_selected() {
        let mut browser = browser();
        assert!(browser.select_category("9").is_err());
        assert!(browser.select_dish("d3").is_err());
        assert!(browser.select_dish("d4").is_err());
        assert_eq!(browser.view(), &MenuView::Categories);
    }
}
