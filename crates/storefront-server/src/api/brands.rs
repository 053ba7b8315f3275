//! Brand CRUD handlers, including the sparse partial-update route.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use storefront_db::BrandRow;

use crate::middleware::RequestId;

use super::{map_db_error, ApiError, ApiResponse, AppState, ResponseMeta};

#[derive(Debug, Deserialize)]
pub(in crate::api) struct BrandRequest {
    pub name: String,
    pub description: Option<String>,
}

/// Body for the partial-update route: absent fields keep their value.
#[derive(Debug, Deserialize)]
pub(in crate::api) struct PartialBrandRequest {
    pub name: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Serialize)]
pub(in crate::api) struct BrandDoc {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<BrandRow> for BrandDoc {
    fn from(row: BrandRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            description: row.description,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

fn validate_name(req_id: &str, name: &str) -> Result<(), ApiError> {
    if name.is_empty() || name.len() > 200 {
        return Err(ApiError::new(
            req_id,
            "validation_error",
            "name must be 1-200 characters",
        ));
    }
    Ok(())
}

/// GET /brands/
pub(in crate::api) async fn list_brands(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<Json<ApiResponse<Vec<BrandDoc>>>, ApiError> {
    let rows = storefront_db::list_brands(&state.pool)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: rows.into_iter().map(BrandDoc::from).collect(),
        meta: ResponseMeta::new(req_id.0),
    }))
}

/// POST /brands/
pub(in crate::api) async fn create_brand(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<BrandRequest>,
) -> Result<(StatusCode, Json<ApiResponse<BrandDoc>>), ApiError> {
    let rid = &req_id.0;
    let name = body.name.trim();
    validate_name(rid, name)?;

    let row =
        storefront_db::create_brand(&state.pool, name, body.description.as_deref().unwrap_or(""))
            .await
            .map_err(|e| map_db_error(rid.clone(), &e))?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse {
            data: BrandDoc::from(row),
            meta: ResponseMeta::new(req_id.0),
        }),
    ))
}

/// GET /brand-detail/{id}
pub(in crate::api) async fn get_brand(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<BrandDoc>>, ApiError> {
    let rid = &req_id.0;
    let row = storefront_db::get_brand(&state.pool, id)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?
        .ok_or_else(|| ApiError::new(rid, "not_found", "record not found"))?;

    Ok(Json(ApiResponse {
        data: BrandDoc::from(row),
        meta: ResponseMeta::new(req_id.0),
    }))
}

/// PUT /brand-detail/{id} — full replace.
pub(in crate::api) async fn update_brand(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<i64>,
    Json(body): Json<BrandRequest>,
) -> Result<Json<ApiResponse<BrandDoc>>, ApiError> {
    let rid = &req_id.0;
    let name = body.name.trim();
    validate_name(rid, name)?;

    let row = storefront_db::update_brand(
        &state.pool,
        id,
        name,
        body.description.as_deref().unwrap_or(""),
    )
    .await
    .map_err(|e| map_db_error(rid.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: BrandDoc::from(row),
        meta: ResponseMeta::new(req_id.0),
    }))
}

/// PUT /brand-partial-update/{id} — only the supplied fields change.
pub(in crate::api) async fn partial_update_brand(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<i64>,
    Json(body): Json<PartialBrandRequest>,
) -> Result<Json<ApiResponse<BrandDoc>>, ApiError> {
    let rid = &req_id.0;
    let trimmed_name = body.name.as_ref().map(|n| n.trim().to_owned());
    if let Some(ref name) = trimmed_name {
        validate_name(rid, name)?;
    }

    let row = storefront_db::update_brand_partial(
        &state.pool,
        id,
        trimmed_name.as_deref(),
        body.description.as_deref(),
    )
    .await
    .map_err(|e| map_db_error(rid.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: BrandDoc::from(row),
        meta: ResponseMeta::new(req_id.0),
    }))
}

/// DELETE /brand-detail/{id}
pub(in crate::api) async fn delete_brand(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    storefront_db::delete_brand(&state.pool, id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: serde_json::json!({ "deleted": true }),
        meta: ResponseMeta::new(req_id.0),
    }))
}
