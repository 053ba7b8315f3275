//! Category CRUD handlers.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use storefront_db::CategoryRow;

use crate::middleware::RequestId;

use super::{map_db_error, ApiError, ApiResponse, AppState, ResponseMeta};

#[derive(Debug, Deserialize)]
pub(in crate::api) struct CategoryRequest {
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Serialize)]
pub(in crate::api) struct CategoryDoc {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<CategoryRow> for CategoryDoc {
    fn from(row: CategoryRow) -> Self {
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

/// GET /categories/
pub(in crate::api) async fn list_categories(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<Json<ApiResponse<Vec<CategoryDoc>>>, ApiError> {
    let rows = storefront_db::list_categories(&state.pool)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: rows.into_iter().map(CategoryDoc::from).collect(),
        meta: ResponseMeta::new(req_id.0),
    }))
}

/// POST /categories/
pub(in crate::api) async fn create_category(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<CategoryRequest>,
) -> Result<(StatusCode, Json<ApiResponse<CategoryDoc>>), ApiError> {
    let rid = &req_id.0;
    let name = body.name.trim();
    validate_name(rid, name)?;

    let row = storefront_db::create_category(
        &state.pool,
        name,
        body.description.as_deref().unwrap_or(""),
    )
    .await
    .map_err(|e| map_db_error(rid.clone(), &e))?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse {
            data: CategoryDoc::from(row),
            meta: ResponseMeta::new(req_id.0),
        }),
    ))
}

/// GET /category-detail/{id}
pub(in crate::api) async fn get_category(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<CategoryDoc>>, ApiError> {
    let rid = &req_id.0;
    let row = storefront_db::get_category(&state.pool, id)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?
        .ok_or_else(|| ApiError::new(rid, "not_found", "record not found"))?;

    Ok(Json(ApiResponse {
        data: CategoryDoc::from(row),
        meta: ResponseMeta::new(req_id.0),
    }))
}

/// PUT /category-detail/{id}
pub(in crate::api) async fn update_category(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<i64>,
    Json(body): Json<CategoryRequest>,
) -> Result<Json<ApiResponse<CategoryDoc>>, ApiError> {
    let rid = &req_id.0;
    let name = body.name.trim();
    validate_name(rid, name)?;

    let row = storefront_db::update_category(
        &state.pool,
        id,
        name,
        body.description.as_deref().unwrap_or(""),
    )
    .await
    .map_err(|e| map_db_error(rid.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: CategoryDoc::from(row),
        meta: ResponseMeta::new(req_id.0),
    }))
}

/// DELETE /category-detail/{id}
pub(in crate::api) async fn delete_category(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    storefront_db::delete_category(&state.pool, id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: serde_json::json!({ "deleted": true }),
        meta: ResponseMeta::new(req_id.0),
    }))
}
