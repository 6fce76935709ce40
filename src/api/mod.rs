//! REST API module.
//!
//! Contains all API routes and handlers for the menu and admin web clients.

mod analytics;
mod auth;
mod categories;
mod datastore;
mod dishes;
mod ingredients;
mod orders;
mod qr;
mod search;

pub use analytics::*;
pub use auth::*;
pub use categories::*;
pub use datastore::*;
pub use dishes::*;
pub use ingredients::*;
pub use orders::*;
pub use qr::*;
pub use search::*;

use axum::{
    extract::{FromRequest, FromRequestParts},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::errors::AppError;
use crate::models::Dish;
use crate::search::SearchContext;
use crate::AppState;

/// Success response envelope.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    pub data: T,
    pub revision_id: i64,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn new(data: T, revision_id: i64) -> Self {
        Self {
            success: true,
            data,
            revision_id,
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}

/// Response type that can be either success or error.
pub type ApiResult<T> = Result<ApiResponse<T>, crate::errors::AppErrorWithRevision>;

/// Create a successful API response.
pub fn success<T: Serialize>(data: T, revision_id: i64) -> ApiResult<T> {
    Ok(ApiResponse::new(data, revision_id))
}

/// Create an error API response.
pub fn error<T: Serialize>(err: AppError, revision_id: i64) -> ApiResult<T> {
    Err(crate::errors::AppErrorWithRevision {
        error: err,
        revision_id,
    })
}

/// JSON body whose rejections use the error envelope.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);

/// Query string whose rejections use the error envelope.
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(AppError))]
pub struct ApiQuery<T>(pub T);

/// Re-index one dish after a write. Index failures are logged, not returned.
async fn reindex_dish(state: &AppState, dish: &Dish) {
    let categories = state.catalog.list_categories().await.unwrap_or_default();
    let ingredients = state.catalog.list_ingredients().await.unwrap_or_default();
    let ctx = SearchContext {
        categories: &categories,
        ingredients: &ingredients,
    };
    if let Err(e) = state.search.index_dish(dish, &ctx).await {
        tracing::warn!("Failed to index dish {}: {}", dish.id, e);
    }
}

/// Rebuild the index after a category or ingredient change, which can alter
/// the searchable text of many dishes.
async fn rebuild_search(state: &AppState) {
    let result = async {
        let dishes = state.catalog.list_dishes().await?;
        let categories = state.catalog.list_categories().await?;
        let ingredients = state.catalog.list_ingredients().await?;
        let ctx = SearchContext {
            categories: &categories,
            ingredients: &ingredients,
        };
        state.search.rebuild(&dishes, &ctx).await
    }
    .await;

    if let Err(e) = result {
        tracing::warn!("Failed to rebuild search index: {}", e);
    }
}
