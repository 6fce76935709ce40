//! Search API endpoints.

use axum::extract::State;
use serde::{Deserialize, Serialize};

use super::{error, success, ApiQuery, ApiResult};
use crate::models::Dish;
use crate::AppState;

/// Search query parameters.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchQuery {
    pub q: String,
    /// Maximum number of results (default: 20).
    #[serde(default = "default_limit")]
    pub limit: usize,
    #[serde(default)]
    pub offset: usize,
    /// Also return inactive dishes (back office).
    #[serde(default)]
    pub include_inactive: bool,
}

fn default_limit() -> usize {
    20
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    pub results: Vec<SearchResultItem>,
    pub total: usize,
    pub limit: usize,
    pub offset: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResultItem {
    pub dish: Dish,
    pub score: f32,
}

/// Maximum number of search results allowed.
const MAX_SEARCH_LIMIT: usize = 100;

/// GET /api/search - Full-text dish search across all languages.
pub async fn search_dishes(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<SearchQuery>,
) -> ApiResult<SearchResponse> {
    let revision_id = state.catalog.revision_id().await.unwrap_or(0);

    let limit = params.limit.min(MAX_SEARCH_LIMIT);

    let search_results = match state.search.search(&params.q, limit, params.offset) {
        Ok(results) => results,
        Err(e) => return error(e, revision_id),
    };

    let mut results = Vec::new();
    for sr in search_results {
        if let Ok(Some(dish)) = state.catalog.get_dish(&sr.dish_id).await {
            if dish.is_active || params.include_inactive {
                results.push(SearchResultItem {
                    dish,
                    score: sr.score,
                });
            }
        }
    }

    let total = results.len();

    success(
        SearchResponse {
            results,
            total,
            limit,
            offset: params.offset,
        },
        revision_id,
    )
}
