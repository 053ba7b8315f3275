//! Tag handlers.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use storefront_db::TagRow;

use crate::middleware::RequestId;

use super::{is_sqlstate, map_db_error, ApiError, ApiResponse, AppState, ResponseMeta};

#[derive(Debug, Deserialize)]
pub(in crate::api) struct TagRequest {
    pub tag_name: String,
}

#[derive(Debug, Serialize)]
pub(in crate::api) struct TagDoc {
    pub id: i64,
    pub product_id: i64,
    pub tag_name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<TagRow> for TagDoc {
    fn from(row: TagRow) -> Self {
        Self {
            id: row.id,
            product_id: row.product_id,
            tag_name: row.tag_name,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

fn validate_tag_name(req_id: &str, name: &str) -> Result<(), ApiError> {
    if name.is_empty() || name.len() > 100 {
        return Err(ApiError::new(
            req_id,
            "validation_error",
            "tag_name must be 1-100 characters",
        ));
    }
    Ok(())
}

/// GET /products/{id}/tags/
pub(in crate::api) async fn list_tags(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(product_id): Path<i64>,
) -> Result<Json<ApiResponse<Vec<TagDoc>>>, ApiError> {
    let rid = &req_id.0;
    storefront_db::get_product(&state.pool, product_id)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?
        .ok_or_else(|| ApiError::new(rid, "not_found", "record not found"))?;

    let rows = storefront_db::list_tags_for_product(&state.pool, product_id)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: rows.into_iter().map(TagDoc::from).collect(),
        meta: ResponseMeta::new(req_id.0),
    }))
}

/// POST /products/{id}/tags/
pub(in crate::api) async fn create_tag(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(product_id): Path<i64>,
    Json(body): Json<TagRequest>,
) -> Result<(StatusCode, Json<ApiResponse<TagDoc>>), ApiError> {
    let rid = &req_id.0;
    let name = body.tag_name.trim();
    validate_tag_name(rid, name)?;

    let row = storefront_db::create_tag(&state.pool, product_id, name)
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
            data: TagDoc::from(row),
            meta: ResponseMeta::new(req_id.0),
        }),
    ))
}

/// GET /tags/{id}
pub(in crate::api) async fn get_tag(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<TagDoc>>, ApiError> {
    let rid = &req_id.0;
    let row = storefront_db::get_tag(&state.pool, id)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?
        .ok_or_else(|| ApiError::new(rid, "not_found", "record not found"))?;

    Ok(Json(ApiResponse {
        data: TagDoc::from(row),
        meta: ResponseMeta::new(req_id.0),
    }))
}

/// PUT /tags/{id}
pub(in crate::api) async fn update_tag(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<i64>,
    Json(body): Json<TagRequest>,
) -> Result<Json<ApiResponse<TagDoc>>, ApiError> {
    let rid = &req_id.0;
    let name = body.tag_name.trim();
    validate_tag_name(rid, name)?;

    let row = storefront_db::update_tag(&state.pool, id, name)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: TagDoc::from(row),
        meta: ResponseMeta::new(req_id.0),
    }))
}

/// DELETE /tags/{id}
pub(in crate::api) async fn delete_tag(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    storefront_db::delete_tag(&state.pool, id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: serde_json::json!({ "deleted": true }),
        meta: ResponseMeta::new(req_id.0),
    }))
}
