//! Variant management handlers, including image attachment.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use storefront_db::VariantRow;

use crate::middleware::RequestId;

use super::{is_sqlstate, map_db_error, ApiError, ApiResponse, AppState, ResponseMeta};

#[derive(Debug, Deserialize)]
pub(in crate::api) struct VariantRequest {
    pub name: String,
    pub price: Decimal,
    pub color: Option<String>,
    pub stock: i32,
    pub size: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(in crate::api) struct AttachImageRequest {
    pub url: String,
}

#[derive(Debug, Serialize)]
pub(in crate::api) struct VariantDoc {
    pub id: i64,
    pub product_id: i64,
    pub name: String,
    pub price: Decimal,
    pub color: String,
    pub stock: i32,
    pub size: String,
}

impl From<VariantRow> for VariantDoc {
    fn from(row: VariantRow) -> Self {
        Self {
            id: row.id,
            product_id: row.product_id,
            name: row.name,
            price: row.price,
            color: row.color,
            stock: row.stock,
            size: row.size,
        }
    }
}

fn validate_variant(req_id: &str, body: &VariantRequest) -> Result<(), ApiError> {
    let name = body.name.trim();
    if name.is_empty() || name.len() > 200 {
        return Err(ApiError::new(
            req_id,
            "validation_error",
            "name must be 1-200 characters",
        ));
    }
    if body.price.is_sign_negative() {
        return Err(ApiError::new(
            req_id,
            "validation_error",
            "price must not be negative",
        ));
    }
    if body.stock < 0 {
        return Err(ApiError::new(
            req_id,
            "validation_error",
            "stock must not be negative",
        ));
    }
    Ok(())
}

/// GET /products/{id}/variants/
pub(in crate::api) async fn list_variants(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(product_id): Path<i64>,
) -> Result<Json<ApiResponse<Vec<VariantDoc>>>, ApiError> {
    let rid = &req_id.0;
    storefront_db::get_product(&state.pool, product_id)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?
        .ok_or_else(|| ApiError::new(rid, "not_found", "record not found"))?;

    let rows = storefront_db::list_variants_for_product(&state.pool, product_id)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: rows.into_iter().map(VariantDoc::from).collect(),
        meta: ResponseMeta::new(req_id.0),
    }))
}

/// POST /products/{id}/variants/
pub(in crate::api) async fn create_variant(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(product_id): Path<i64>,
    Json(body): Json<VariantRequest>,
) -> Result<(StatusCode, Json<ApiResponse<VariantDoc>>), ApiError> {
    let rid = &req_id.0;
    validate_variant(rid, &body)?;

    let row = storefront_db::create_variant(
        &state.pool,
        product_id,
        body.name.trim(),
        body.price,
        body.color.as_deref().unwrap_or(""),
        body.stock,
        body.size.as_deref().unwrap_or(""),
    )
    .await
    .map_err(|e| {
        if is_sqlstate(&e, "23503") {
            ApiError::new(rid, "not_found", "record not found")
        } else {
            map_db_error(rid.clone(), &e)
        }
    })?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse {
            data: VariantDoc::from(row),
            meta: ResponseMeta::new(req_id.0),
        }),
    ))
}

/// PUT /variants/{id} — full replace.
pub(in crate::api) async fn update_variant(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<i64>,
    Json(body): Json<VariantRequest>,
) -> Result<Json<ApiResponse<VariantDoc>>, ApiError> {
    let rid = &req_id.0;
    validate_variant(rid, &body)?;

    let row = storefront_db::update_variant(
        &state.pool,
        id,
        body.name.trim(),
        body.price,
        body.color.as_deref().unwrap_or(""),
        body.stock,
        body.size.as_deref().unwrap_or(""),
    )
    .await
    .map_err(|e| map_db_error(rid.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: VariantDoc::from(row),
        meta: ResponseMeta::new(req_id.0),
    }))
}

/// DELETE /variants/{id}
pub(in crate::api) async fn delete_variant(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    storefront_db::delete_variant(&state.pool, id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: serde_json::json!({ "deleted": true }),
        meta: ResponseMeta::new(req_id.0),
    }))
}

/// POST /variants/{id}/images/ — store an image URL and link it.
pub(in crate::api) async fn attach_image(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<i64>,
    Json(body): Json<AttachImageRequest>,
) -> Result<(StatusCode, Json<ApiResponse<serde_json::Value>>), ApiError> {
    let rid = &req_id.0;
    let url = body.url.trim();
    if url.is_empty() {
        return Err(ApiError::new(
            rid,
            "validation_error",
            "url must not be empty",
        ));
    }

    let image_id = storefront_db::attach_variant_image(&state.pool, id, url)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse {
            data: serde_json::json!({ "image_id": image_id }),
            meta: ResponseMeta::new(req_id.0),
        }),
    ))
}
