//! Menu presentation: list queries, customer navigation and the localized menu.

mod browser;
mod query;
mod seed;

pub use browser::*;
pub use query::*;
pub use seed::*;

use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::models::{Allergens, Category, Dietary, Dish, DishTags, Locale, Price};

/// Query string of GET /api/menu.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct MenuQuery {
    pub lang: Locale,
    pub filter: QuickFilter,
}

/// The active menu rendered in one language.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalizedMenu {
    pub language: Locale,
    pub sections: Vec<MenuSection>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuSection {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    pub dishes: Vec<MenuDish>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuDish {
    pub id: String,
    pub name: String,
    pub description: String,
    pub price: Price,
    pub images: Vec<String>,
    pub tags: DishTags,
    pub dietary: Dietary,
    pub allergens: Allergens,
    pub is_customizable: bool,
}

impl MenuDish {
    fn localize(dish: &Dish, lang: Locale) -> Self {
        Self {
            id: dish.id.clone(),
            name: dish.name.get(lang).to_string(),
            description: dish.description.get(lang).to_string(),
            price: dish.price.clone(),
            images: dish.images.clone(),
            tags: dish.tags,
            dietary: dish.dietary,
            allergens: dish.allergens,
            is_customizable: dish.customization.is_customizable,
        }
    }
}

/// Render active categories in order with their active dishes. With a filter
/// other than `all`, sections left without dishes are dropped.
pub fn render_menu(
    categories: Vec<Category>,
    dishes: Vec<Dish>,
    query: &MenuQuery,
) -> LocalizedMenu {
    let browser = MenuBrowser::new(categories, dishes);
    let lang = query.lang;

    let sections = browser
        .categories()
        .iter()
        .map(|category| MenuSection {
            id: category.id.clone(),
            name: category.name.get(lang).to_string(),
            description: category.description.as_ref().map(|d| d.get(lang).to_string()),
            icon: category.icon.clone(),
            dishes: browser
                .dishes_in(&category.id, query.filter)
                .into_iter()
                .map(|d| MenuDish::localize(d, lang))
                .collect(),
        })
        .filter(|section| query.filter == QuickFilter::All || !section.dishes.is_empty())
        .collect();

    LocalizedMenu {
        language: lang,
        sections,
    }
}

/// Query string of GET /api/menu/screen. Replays a navigation path: a
/// filter or a category, then an optional dish, then `back` steps. `reset`
/// ends on the category list.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct ScreenQuery {
    pub lang: Locale,
    pub filter: QuickFilter,
    pub category: Option<String>,
    pub dish: Option<String>,
    pub back: usize,
    pub reset: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuCategory {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
}

/// One screen of the customer app.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuScreen {
    pub language: Locale,
    pub view: MenuView,
    pub categories: Vec<MenuCategory>,
    pub dishes: Vec<MenuDish>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selected: Option<MenuDish>,
}

/// Walk the browser along `query` and render where it ends up.
pub fn open_screen(
    categories: Vec<Category>,
    dishes: Vec<Dish>,
    query: &ScreenQuery,
) -> Result<MenuScreen, AppError> {
    let mut browser = MenuBrowser::new(categories, dishes);
    let lang = query.lang;

    if query.filter != QuickFilter::All {
        browser.apply_filter(query.filter);
    } else if let Some(category_id) = &query.category {
        browser.select_category(category_id)?;
    }
    if let Some(dish_id) = &query.dish {
        browser.select_dish(dish_id)?;
    }
    for _ in 0..query.back {
        if !browser.back() {
            break;
        }
    }
    if query.reset {
        browser.back_to_categories();
    }

    Ok(MenuScreen {
        language: lang,
        view: browser.view().clone(),
        categories: browser
            .categories()
            .iter()
            .map(|c| MenuCategory {
                id: c.id.clone(),
                name: c.name.get(lang).to_string(),
                icon: c.icon.clone(),
            })
            .collect(),
        dishes: browser
            .visible_dishes()
            .into_iter()
            .map(|d| MenuDish::localize(d, lang))
            .collect(),
        selected: browser.selected_dish().map(|d| MenuDish::localize(d, lang)),
    })
}

#[cfg(test)]
pub(crate) mod fixtures {
    use crate::models::{now_timestamp, Category, Dish, LocalizedText, Price};

    pub(crate) fn dish(id: &str, name: &str, category: &str, amount: f64) -> Dish {
        Dish {
            id: id.to_string(),
            name: LocalizedText::uniform(name),
            description: LocalizedText::uniform(&format!("{} description", name)),
            category: category.to_string(),
            price: Price {
                amount,
                currency: "THB".to_string(),
            },
            images: Vec::new(),
            ingredients: Vec::new(),
            tags: Default::default(),
            dietary: Default::default(),
            allergens: Default::default(),
            customization: Default::default(),
            is_active: true,
            views: 0,
            order: 0,
            created_at: now_timestamp(),
            updated_at: now_timestamp(),
            version: 1,
        }
    }

    pub(crate) fn category(id: &str, name: &str, order: i32) -> Category {
        Category {
            id: id.to_string(),
            name: LocalizedText::uniform(name),
            description: None,
            icon: None,
            order,
            is_active: true,
            dish_count: 0,
            created_at: now_timestamp(),
            updated_at: now_timestamp(),
            version: 1,
        }
    }
}
