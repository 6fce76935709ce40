//! Order API endpoints.

use axum::extract::{Path, State};
use serde::Deserialize;

use super::{error, success, ApiJson, ApiQuery, ApiResult};
use crate::errors::AppError;
use crate::models::{CreateOrderRequest, Order, OrderStatus, UpdateOrderStatusRequest};
use crate::AppState;

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct OrderListQuery {
    pub status: Option<OrderStatus>,
    pub table: Option<u32>,
}

/// POST /api/orders - Place an order from a table.
pub async fn create_order(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<CreateOrderRequest>,
) -> ApiResult<Order> {
    let revision_id = state.catalog.revision_id().await.unwrap_or(0);

    let dishes = match state.catalog.list_dishes().await {
        Ok(dishes) => dishes,
        Err(e) => return error(e, revision_id),
    };

    let order = match Order::place(request, &dishes) {
        Ok(order) => order,
        Err(message) => return error(AppError::Validation(message), revision_id),
    };

    match state.repo.create_order(&order).await {
        Ok(()) => {
            tracing::info!(
                "Order {} placed at table {} ({} items)",
                order.id,
                order.table_number,
                order.items.len()
            );
            success(order, revision_id)
        }
        Err(e) => error(e, revision_id),
    }
}

/// GET /api/orders - List orders, newest first.
pub async fn list_orders(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<OrderListQuery>,
) -> ApiResult<Vec<Order>> {
    let revision_id = state.catalog.revision_id().await.unwrap_or(0);

    match state.repo.list_orders(query.status, query.table).await {
        Ok(orders) => success(orders, revision_id),
        Err(e) => error(e, revision_id),
    }
}

/// GET /api/orders/:id - Get a single order.
pub async fn get_order(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Order> {
    let revision_id = state.catalog.revision_id().await.unwrap_or(0);

    match state.repo.get_order(&id).await {
        Ok(Some(order)) => success(order, revision_id),
        Ok(None) => error(
            AppError::NotFound(format!("Order {} not found", id)),
            revision_id,
        ),
        Err(e) => error(e, revision_id),
    }
}

/// PUT /api/orders/:id/status - Move an order through its lifecycle.
pub async fn update_order_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(request): ApiJson<UpdateOrderStatusRequest>,
) -> ApiResult<Order> {
    let revision_id = state.catalog.revision_id().await.unwrap_or(0);

    match state.repo.update_order_status(&id, request.status).await {
        Ok(order) => success(order, revision_id),
        Err(e) => error(e, revision_id),
    }
}
