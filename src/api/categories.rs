//! Category API endpoints.

use axum::extract::{Path, State};

use super::{error, rebuild_search, success, ApiJson, ApiQuery, ApiResult};
use crate::errors::AppError;
use crate::menu::CategoryQuery;
use crate::models::{Category, CreateCategoryRequest, UpdateCategoryRequest};
use crate::AppState;

/// GET /api/categories - List categories.
pub async fn list_categories(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<CategoryQuery>,
) -> ApiResult<Vec<Category>> {
    let revision_id = state.catalog.revision_id().await.unwrap_or(0);

    match state.catalog.list_categories().await {
        Ok(categories) => success(query.apply(categories), revision_id),
        Err(e) => error(e, revision_id),
    }
}

/// GET /api/categories/:id - Get a single category.
pub async fn get_category(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Category> {
    let revision_id = state.catalog.revision_id().await.unwrap_or(0);

    match state.catalog.get_category(&id).await {
        Ok(Some(category)) => success(category, revision_id),
        Ok(None) => error(
            AppError::NotFound(format!("Category {} not found", id)),
            revision_id,
        ),
        Err(e) => error(e, revision_id),
    }
}

/// POST /api/categories - Create a new category.
pub async fn create_category(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<CreateCategoryRequest>,
) -> ApiResult<Category> {
    let revision_id = state.catalog.revision_id().await.unwrap_or(0);

    match state.catalog.create_category(&request).await {
        Ok(category) => {
            let new_revision = state.catalog.revision_id().await.unwrap_or(revision_id);
            success(category, new_revision)
        }
        Err(e) => error(e, revision_id),
    }
}

/// PUT /api/categories/:id - Update a category.
pub async fn update_category(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(request): ApiJson<UpdateCategoryRequest>,
) -> ApiResult<Category> {
    let revision_id = state.catalog.revision_id().await.unwrap_or(0);

    match state.catalog.update_category(&id, &request).await {
        Ok(category) => {
            if request.name.is_some() {
                rebuild_search(&state).await;
            }
            let new_revision = state.catalog.revision_id().await.unwrap_or(revision_id);
            success(category, new_revision)
        }
        Err(e) => error(e, revision_id),
    }
}

/// PATCH /api/categories/:id/toggle-active - Flip the active flag.
pub async fn toggle_category_active(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Category> {
    let revision_id = state.catalog.revision_id().await.unwrap_or(0);

    match state.catalog.toggle_category_active(&id).await {
        Ok(category) => {
            let new_revision = state.catalog.revision_id().await.unwrap_or(revision_id);
            success(category, new_revision)
        }
        Err(e) => error(e, revision_id),
    }
}

/// DELETE /api/categories/:id - Delete a category no active dish uses.
pub async fn delete_category(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<()> {
    let revision_id = state.catalog.revision_id().await.unwrap_or(0);

    match state.catalog.delete_category(&id).await {
        Ok(()) => {
            tracing::info!("Deleted category {}", id);
            let new_revision = state.catalog.revision_id().await.unwrap_or(revision_id);
            success((), new_revision)
        }
        Err(e) => error(e, revision_id),
    }
}
