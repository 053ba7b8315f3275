//! Checkout and order handlers. Orders are immutable snapshots; after
//! creation only the status moves, and only along the state machine.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use storefront_core::OrderStatus;
use storefront_db::{OrderItemRow, OrderRow};

use crate::middleware::{CurrentUser, RequestId};

use super::{map_db_error, ApiError, ApiResponse, AppState, ResponseMeta};

#[derive(Debug, Deserialize)]
pub(in crate::api) struct UpdateStatusRequest {
    pub status: String,
}

#[derive(Debug, Serialize)]
pub(in crate::api) struct OrderDoc {
    pub id: i64,
    pub status: String,
    pub total_amount: Decimal,
    pub payment_status: String,
    pub payment_mode: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub(in crate::api) struct OrderItemDoc {
    pub id: i64,
    pub variant_id: i64,
    pub quantity: i32,
    pub price: Decimal,
}

/// An order with its line items, as returned by the single-order read.
#[derive(Debug, Serialize)]
pub(in crate::api) struct OrderDetailDoc {
    #[serde(flatten)]
    pub order: OrderDoc,
    pub items: Vec<OrderItemDoc>,
}

impl From<OrderRow> for OrderDoc {
    fn from(row: OrderRow) -> Self {
        Self {
            id: row.id,
            status: row.status,
            total_amount: row.total_amount,
            payment_status: row.payment_status,
            payment_mode: row.payment_mode,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

impl From<OrderItemRow> for OrderItemDoc {
    fn from(row: OrderItemRow) -> Self {
        Self {
            id: row.id,
            variant_id: row.variant_id,
            quantity: row.quantity,
            price: row.price,
        }
    }
}

/// POST /checkout/ — snapshot the cart into an order.
pub(in crate::api) async fn checkout(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(user): Extension<CurrentUser>,
) -> Result<(StatusCode, Json<ApiResponse<OrderDoc>>), ApiError> {
    let row = storefront_db::checkout(&state.pool, user.id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse {
            data: OrderDoc::from(row),
            meta: ResponseMeta::new(req_id.0),
        }),
    ))
}

/// GET /orders/ — the caller's orders, newest first.
pub(in crate::api) async fn list_orders(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Json<ApiResponse<Vec<OrderDoc>>>, ApiError> {
    let rows = storefront_db::list_orders_for_user(&state.pool, user.id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: rows.into_iter().map(OrderDoc::from).collect(),
        meta: ResponseMeta::new(req_id.0),
    }))
}

/// GET /orders/{id} — one order with its items, scoped to the caller.
pub(in crate::api) async fn get_order(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<OrderDetailDoc>>, ApiError> {
    let rid = &req_id.0;
    let order = storefront_db::get_order_for_user(&state.pool, user.id, id)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?
        .ok_or_else(|| ApiError::new(rid, "not_found", "record not found"))?;

    let items = storefront_db::list_order_items(&state.pool, order.id)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: OrderDetailDoc {
            order: OrderDoc::from(order),
            items: items.into_iter().map(OrderItemDoc::from).collect(),
        },
        meta: ResponseMeta::new(req_id.0),
    }))
}

/// PUT /orders/{id}/status — advance the order along the state machine.
pub(in crate::api) async fn update_status(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i64>,
    Json(body): Json<UpdateStatusRequest>,
) -> Result<Json<ApiResponse<OrderDoc>>, ApiError> {
    let rid = &req_id.0;
    let new_status: OrderStatus = body.status.parse().map_err(|_| {
        ApiError::new(
            rid,
            "validation_error",
            format!("unknown order status '{}'", body.status),
        )
    })?;

    let row = storefront_db::update_order_status(&state.pool, user.id, id, new_status)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: OrderDoc::from(row),
        meta: ResponseMeta::new(req_id.0),
    }))
}
