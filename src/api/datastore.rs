//! Catalog snapshot and customer menu endpoints.

use axum::extract::State;

use super::{error, success, ApiQuery, ApiResult};
use crate::errors::AppErrorWithRevision;
use crate::menu::{open_screen, render_menu, LocalizedMenu, MenuQuery, MenuScreen, ScreenQuery};
use crate::models::{Datastore, RevisionInfo};
use crate::AppState;

/// GET /api/datastore - Get the full catalog.
pub async fn get_datastore(State(state): State<AppState>) -> ApiResult<Datastore> {
    let datastore = state
        .catalog
        .snapshot()
        .await
        .map_err(|e| AppErrorWithRevision {
            error: e,
            revision_id: 0,
        })?;

    let revision_id = datastore.revision_id;
    success(datastore, revision_id)
}

/// GET /api/datastore/revision - Get the current revision info.
pub async fn get_revision(State(state): State<AppState>) -> ApiResult<RevisionInfo> {
    let revision_info = state
        .catalog
        .revision_info()
        .await
        .map_err(|e| AppErrorWithRevision {
            error: e,
            revision_id: 0,
        })?;

    let revision_id = revision_info.revision_id;
    success(revision_info, revision_id)
}

/// GET /api/menu - The active menu in one language.
pub async fn get_menu(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<MenuQuery>,
) -> ApiResult<LocalizedMenu> {
    let revision_id = state.catalog.revision_id().await.unwrap_or(0);

    let categories = match state.catalog.list_categories().await {
        Ok(categories) => categories,
        Err(e) => return error(e, revision_id),
    };
    let dishes = match state.catalog.list_dishes().await {
        Ok(dishes) => dishes,
        Err(e) => return error(e, revision_id),
    };

    success(render_menu(categories, dishes, &query), revision_id)
}

/// GET /api/menu/screen - One customer screen, rebuilt from a navigation path.
pub async fn get_menu_screen(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ScreenQuery>,
) -> ApiResult<MenuScreen> {
    let revision_id = state.catalog.revision_id().await.unwrap_or(0);

    let categories = match state.catalog.list_categories().await {
        Ok(categories) => categories,
        Err(e) => return error(e, revision_id),
    };
    let dishes = match state.catalog.list_dishes().await {
        Ok(dishes) => dishes,
        Err(e) => return error(e, revision_id),
    };

    match open_screen(categories, dishes, &query) {
        Ok(screen) => success(screen, revision_id),
        Err(e) => error(e, revision_id),
    }
}
