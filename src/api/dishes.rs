//! Dish API endpoints.

use axum::extract::{Path, State};

use super::{error, reindex_dish, success, ApiJson, ApiQuery, ApiResult};
use crate::errors::AppError;
use crate::menu::DishQuery;
use crate::models::{CreateDishRequest, Dish, UpdateDishRequest};
use crate::AppState;

/// GET /api/dishes - List dishes with optional search, filter and sort.
pub async fn list_dishes(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<DishQuery>,
) -> ApiResult<Vec<Dish>> {
    let revision_id = state.catalog.revision_id().await.unwrap_or(0);

    match state.catalog.list_dishes().await {
        Ok(dishes) => success(query.apply(dishes), revision_id),
        Err(e) => error(e, revision_id),
    }
}

/// GET /api/dishes/:id - Get a single dish.
pub async fn get_dish(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Dish> {
    let revision_id = state.catalog.revision_id().await.unwrap_or(0);

    match state.catalog.get_dish(&id).await {
        Ok(Some(dish)) => success(dish, revision_id),
        Ok(None) => error(
            AppError::NotFound(format!("Dish {} not found", id)),
            revision_id,
        ),
        Err(e) => error(e, revision_id),
    }
}

/// POST /api/dishes - Create a new dish.
pub async fn create_dish(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<CreateDishRequest>,
) -> ApiResult<Dish> {
    let revision_id = state.catalog.revision_id().await.unwrap_or(0);

    match state.catalog.create_dish(&request).await {
        Ok(dish) => {
            reindex_dish(&state, &dish).await;
            tracing::info!("Created dish {}", dish.id);

            let new_revision = state.catalog.revision_id().await.unwrap_or(revision_id);
            success(dish, new_revision)
        }
        Err(e) => error(e, revision_id),
    }
}

/// PUT /api/dishes/:id - Update a dish. Absent fields are kept.
pub async fn update_dish(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(request): ApiJson<UpdateDishRequest>,
) -> ApiResult<Dish> {
    let revision_id = state.catalog.revision_id().await.unwrap_or(0);

    match state.catalog.update_dish(&id, &request).await {
        Ok(dish) => {
            reindex_dish(&state, &dish).await;

            let new_revision = state.catalog.revision_id().await.unwrap_or(revision_id);
            success(dish, new_revision)
        }
        Err(e) => error(e, revision_id),
    }
}

/// PATCH /api/dishes/:id/toggle-active - Flip the active flag.
pub async fn toggle_dish_active(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Dish> {
    let revision_id = state.catalog.revision_id().await.unwrap_or(0);

    match state.catalog.toggle_dish_active(&id).await {
        Ok(dish) => {
            let new_revision = state.catalog.revision_id().await.unwrap_or(revision_id);
            success(dish, new_revision)
        }
        Err(e) => error(e, revision_id),
    }
}

/// DELETE /api/dishes/:id - Delete a dish.
pub async fn delete_dish(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<()> {
    let revision_id = state.catalog.revision_id().await.unwrap_or(0);

    match state.catalog.delete_dish(&id).await {
        Ok(()) => {
            if let Err(e) = state.search.remove_dish(&id).await {
                tracing::warn!("Failed to remove dish from index: {}", e);
            }
            tracing::info!("Deleted dish {}", id);

            let new_revision = state.catalog.revision_id().await.unwrap_or(revision_id);
            success((), new_revision)
        }
        Err(e) => error(e, revision_id),
    }
}
