//! Product CRUD handlers. The nested read-model lives in `product_detail`.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use storefront_db::ProductRow;

use crate::middleware::RequestId;

use super::{is_sqlstate, map_db_error, ApiError, ApiResponse, AppState, ResponseMeta};

#[derive(Debug, Deserialize)]
pub(in crate::api) struct ProductRequest {
    pub category_id: Option<i64>,
    pub brand_id: Option<i64>,
    pub base_name: String,
    pub description: Option<String>,
    pub base_price: Decimal,
    pub metadata: Option<serde_json::Value>,
}

#[derive(Debug, Serialize)]
pub(in crate::api) struct ProductDoc {
    pub id: i64,
    pub category_id: Option<i64>,
    pub brand_id: Option<i64>,
    pub base_name: String,
    pub description: String,
    pub base_price: Decimal,
    pub metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<ProductRow> for ProductDoc {
    fn from(row: ProductRow) -> Self {
        Self {
            id: row.id,
            category_id: row.category_id,
            brand_id: row.brand_id,
            base_name: row.base_name,
            description: row.description,
            base_price: row.base_price,
            metadata: row.metadata,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

fn validate_product(req_id: &str, body: &ProductRequest) -> Result<(), ApiError> {
    let name = body.base_name.trim();
    if name.is_empty() || name.len() > 200 {
        return Err(ApiError::new(
            req_id,
            "validation_error",
            "base_name must be 1-200 characters",
        ));
    }
    if body.base_price.is_sign_negative() {
        return Err(ApiError::new(
            req_id,
            "validation_error",
            "base_price must not be negative",
        ));
    }
    Ok(())
}

fn map_fk_violation(req_id: &str, e: &storefront_db::DbError) -> ApiError {
    if is_sqlstate(e, "23503") {
        return ApiError::new(
            req_id,
            "validation_error",
            "referenced category or brand does not exist",
        );
    }
    map_db_error(req_id.to_owned(), e)
}

/// GET /products/
pub(in crate::api) async fn list_products(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<Json<ApiResponse<Vec<ProductDoc>>>, ApiError> {
    let rows = storefront_db::list_products(&state.pool)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: rows.into_iter().map(ProductDoc::from).collect(),
        meta: ResponseMeta::new(req_id.0),
    }))
}

/// POST /products/
pub(in crate::api) async fn create_product(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<ProductRequest>,
) -> Result<(StatusCode, Json<ApiResponse<ProductDoc>>), ApiError> {
    let rid = &req_id.0;
    validate_product(rid, &body)?;

    let metadata = body.metadata.unwrap_or_else(|| serde_json::json!({}));
    let row = storefront_db::create_product(
        &state.pool,
        body.category_id,
        body.brand_id,
        body.base_name.trim(),
        body.description.as_deref().unwrap_or(""),
        body.base_price,
        &metadata,
    )
    .await
    .map_err(|e| map_fk_violation(rid, &e))?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse {
            data: ProductDoc::from(row),
            meta: ResponseMeta::new(req_id.0),
        }),
    ))
}

/// GET /products/{id}
pub(in crate::api) async fn get_product(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<ProductDoc>>, ApiError> {
    let rid = &req_id.0;
    let row = storefront_db::get_product(&state.pool, id)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?
        .ok_or_else(|| ApiError::new(rid, "not_found", "record not found"))?;

    Ok(Json(ApiResponse {
        data: ProductDoc::from(row),
        meta: ResponseMeta::new(req_id.0),
    }))
}

/// PUT /products/{id} — full replace.
pub(in crate::api) async fn update_product(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<i64>,
    Json(body): Json<ProductRequest>,
) -> Result<Json<ApiResponse<ProductDoc>>, ApiError> {
    let rid = &req_id.0;
    validate_product(rid, &body)?;

    let metadata = body.metadata.unwrap_or_else(|| serde_json::json!({}));
    let row = storefront_db::update_product(
        &state.pool,
        id,
        body.category_id,
        body.brand_id,
        body.base_name.trim(),
        body.description.as_deref().unwrap_or(""),
        body.base_price,
        &metadata,
    )
    .await
    .map_err(|e| map_fk_violation(rid, &e))?;

    Ok(Json(ApiResponse {
        data: ProductDoc::from(row),
        meta: ResponseMeta::new(req_id.0),
    }))
}

/// DELETE /products/{id} — variants and dependents cascade.
pub(in crate::api) async fn delete_product(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    storefront_db::delete_product(&state.pool, id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: serde_json::json!({ "deleted": true }),
        meta: ResponseMeta::new(req_id.0),
    }))
}
