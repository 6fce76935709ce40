//! Ingredient API endpoints.

use axum::extract::{Path, State};

use super::{error, rebuild_search, success, ApiJson, ApiQuery, ApiResult};
use crate::errors::AppError;
use crate::menu::IngredientQuery;
use crate::models::{CreateIngredientRequest, Ingredient, UpdateIngredientRequest};
use crate::AppState;

/// GET /api/ingredients - List ingredients.
pub async fn list_ingredients(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<IngredientQuery>,
) -> ApiResult<Vec<Ingredient>> {
    let revision_id = state.catalog.revision_id().await.unwrap_or(0);

    match state.catalog.list_ingredients().await {
        Ok(ingredients) => success(query.apply(ingredients), revision_id),
        Err(e) => error(e, revision_id),
    }
}

/// GET /api/ingredients/:id - Get a single ingredient.
pub async fn get_ingredient(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Ingredient> {
    let revision_id = state.catalog.revision_id().await.unwrap_or(0);

    match state.catalog.get_ingredient(&id).await {
        Ok(Some(ingredient)) => success(ingredient, revision_id),
        Ok(None) => error(
            AppError::NotFound(format!("Ingredient {} not found", id)),
            revision_id,
        ),
        Err(e) => error(e, revision_id),
    }
}

/// POST /api/ingredients - Create a new ingredient.
pub async fn create_ingredient(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<CreateIngredientRequest>,
) -> ApiResult<Ingredient> {
    let revision_id = state.catalog.revision_id().await.unwrap_or(0);

    match state.catalog.create_ingredient(&request).await {
        Ok(ingredient) => {
            let new_revision = state.catalog.revision_id().await.unwrap_or(revision_id);
            success(ingredient, new_revision)
        }
        Err(e) => error(e, revision_id),
    }
}

/// PUT /api/ingredients/:id - Update an ingredient.
pub async fn update_ingredient(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(request): ApiJson<UpdateIngredientRequest>,
) -> ApiResult<Ingredient> {
    let revision_id = state.catalog.revision_id().await.unwrap_or(0);

    match state.catalog.update_ingredient(&id, &request).await {
        Ok(ingredient) => {
            if request.name.is_some() {
                rebuild_search(&state).await;
            }
            let new_revision = state.catalog.revision_id().await.unwrap_or(revision_id);
            success(ingredient, new_revision)
        }
        Err(e) => error(e, revision_id),
    }
}

/// PATCH /api/ingredients/:id/toggle-active - Flip the active flag.
pub async fn toggle_ingredient_active(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Ingredient> {
    let revision_id = state.catalog.revision_id().await.unwrap_or(0);

    match state.catalog.toggle_ingredient_active(&id).await {
        Ok(ingredient) => {
            let new_revision = state.catalog.revision_id().await.unwrap_or(revision_id);
            success(ingredient, new_revision)
        }
        Err(e) => error(e, revision_id),
    }
}

/// DELETE /api/ingredients/:id - Delete an ingredient no active dish uses.
pub async fn delete_ingredient(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<()> {
    let revision_id = state.catalog.revision_id().await.unwrap_or(0);

    match state.catalog.delete_ingredient(&id).await {
        Ok(()) => {
            rebuild_search(&state).await;
            let new_revision = state.catalog.revision_id().await.unwrap_or(revision_id);
            success((), new_revision)
        }
        Err(e) => error(e, revision_id),
    }
}
