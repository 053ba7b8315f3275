//! Cart handlers. Quantity/stock enforcement lives in the db layer where
//! the variant row lock is held; these handlers only shape the documents.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use storefront_db::CartItemRow;

use crate::middleware::{CurrentUser, RequestId};

use super::{map_db_error, ApiError, ApiResponse, AppState, ResponseMeta};

#[derive(Debug, Deserialize)]
pub(in crate::api) struct AddItemRequest {
    pub variant_id: i64,
    pub quantity: i32,
}

#[derive(Debug, Deserialize)]
pub(in crate::api) struct UpdateItemRequest {
    pub quantity: i32,
}

#[derive(Debug, Serialize)]
pub(in crate::api) struct CartItemDoc {
    pub id: i64,
    pub variant_id: i64,
    pub variant_name: String,
    pub price: Decimal,
    pub stock: i32,
    pub quantity: i32,
}

#[derive(Debug, Serialize)]
pub(in crate::api) struct CartDoc {
    pub items: Vec<CartItemDoc>,
    pub total: Decimal,
}

impl From<CartItemRow> for CartItemDoc {
    fn from(row: CartItemRow) -> Self {
        Self {
            id: row.id,
            variant_id: row.variant_id,
            variant_name: row.variant_name,
            price: row.variant_price,
            stock: row.variant_stock,
            quantity: row.quantity,
        }
    }
}

fn validate_quantity(req_id: &str, quantity: i32) -> Result<(), ApiError> {
    if quantity >= 1 {
        Ok(())
    } else {
        Err(ApiError::new(
            req_id,
            "validation_error",
            "quantity must be at least 1",
        ))
    }
}

fn cart_doc(items: Vec<CartItemRow>) -> CartDoc {
    let total = items
        .iter()
        .map(|i| i.variant_price * Decimal::from(i.quantity))
        .sum();
    CartDoc {
        items: items.into_iter().map(CartItemDoc::from).collect(),
        total,
    }
}

/// GET /cart/ — an absent cart reads as empty.
pub(in crate::api) async fn get_cart(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Json<ApiResponse<CartDoc>>, ApiError> {
    let items = storefront_db::list_cart_items(&state.pool, user.id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: cart_doc(items),
        meta: ResponseMeta::new(req_id.0),
    }))
}

/// POST /cart/items/ — accumulating upsert; creates the cart if absent.
pub(in crate::api) async fn add_item(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(user): Extension<CurrentUser>,
    Json(body): Json<AddItemRequest>,
) -> Result<(StatusCode, Json<ApiResponse<CartItemDoc>>), ApiError> {
    let rid = &req_id.0;
    validate_quantity(rid, body.quantity)?;

    let row = storefront_db::add_to_cart(&state.pool, user.id, body.variant_id, body.quantity)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse {
            data: CartItemDoc::from(row),
            meta: ResponseMeta::new(req_id.0),
        }),
    ))
}

/// PUT /cart/items/{id} — replace the item's quantity outright.
pub(in crate::api) async fn update_item(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i64>,
    Json(body): Json<UpdateItemRequest>,
) -> Result<Json<ApiResponse<CartItemDoc>>, ApiError> {
    let rid = &req_id.0;
    validate_quantity(rid, body.quantity)?;

    let row = storefront_db::update_cart_item_quantity(&state.pool, user.id, id, body.quantity)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: CartItemDoc::from(row),
        meta: ResponseMeta::new(req_id.0),
    }))
}

/// DELETE /cart/items/{id}
pub(in crate::api) async fn remove_item(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    storefront_db::remove_cart_item(&state.pool, user.id, id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: serde_json::json!({ "removed": true }),
        meta: ResponseMeta::new(req_id.0),
    }))
}
