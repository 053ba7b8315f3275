//! Review handlers. The reviewer is always the authenticated caller;
//! edits and deletes are scoped to the author at the query level.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use storefront_db::ReviewRow;

use crate::middleware::{CurrentUser, RequestId};

use super::{is_sqlstate, map_db_error, ApiError, ApiResponse, AppState, ResponseMeta};

#[derive(Debug, Deserialize)]
pub(in crate::api) struct ReviewRequest {
    pub comment: String,
    pub rating: i32,
}

#[derive(Debug, Serialize)]
pub(in crate::api) struct ReviewDoc {
    pub id: i64,
    pub product_id: i64,
    pub reviewer: String,
    pub comment: String,
    pub rating: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<ReviewRow> for ReviewDoc {
    fn from(row: ReviewRow) -> Self {
        Self {
            id: row.id,
            product_id: row.product_id,
            reviewer: row.reviewer_username,
            comment: row.comment,
            rating: row.rating,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

fn validate_rating(req_id: &str, rating: i32) -> Result<(), ApiError> {
    if matches!(rating, 1..=5) {
        Ok(())
    } else {
        Err(ApiError::new(
            req_id,
            "validation_error",
            format!("rating must be between 1 and 5, got {rating}"),
        ))
    }
}

/// GET /products/{id}/reviews/
pub(in crate::api) async fn list_reviews(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(product_id): Path<i64>,
) -> Result<Json<ApiResponse<Vec<ReviewDoc>>>, ApiError> {
    let rid = &req_id.0;
    storefront_db::get_product(&state.pool, product_id)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?
        .ok_or_else(|| ApiError::new(rid, "not_found", "record not found"))?;

    let rows = storefront_db::list_reviews_for_product(&state.pool, product_id)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: rows.into_iter().map(ReviewDoc::from).collect(),
        meta: ResponseMeta::new(req_id.0),
    }))
}

/// POST /products/{id}/reviews/
pub(in crate::api) async fn create_review(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(user): Extension<CurrentUser>,
    Path(product_id): Path<i64>,
    Json(body): Json<ReviewRequest>,
) -> Result<(StatusCode, Json<ApiResponse<ReviewDoc>>), ApiError> {
    let rid = &req_id.0;
    validate_rating(rid, body.rating)?;

    let row = storefront_db::create_review(
        &state.pool,
        product_id,
        user.id,
        body.comment.trim(),
        body.rating,
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
            data: ReviewDoc::from(row),
            meta: ResponseMeta::new(req_id.0),
        }),
    ))
}

/// GET /reviews/{id}
pub(in crate::api) async fn get_review(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<ReviewDoc>>, ApiError> {
    let rid = &req_id.0;
    let row = storefront_db::get_review(&state.pool, id)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?
        .ok_or_else(|| ApiError::new(rid, "not_found", "record not found"))?;

    Ok(Json(ApiResponse {
        data: ReviewDoc::from(row),
        meta: ResponseMeta::new(req_id.0),
    }))
}

/// PUT /reviews/{id} — only the author may edit; anyone else sees 404.
pub(in crate::api) async fn update_review(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i64>,
    Json(body): Json<ReviewRequest>,
) -> Result<Json<ApiResponse<ReviewDoc>>, ApiError> {
    let rid = &req_id.0;
    validate_rating(rid, body.rating)?;

    let row = storefront_db::update_review(&state.pool, id, user.id, body.comment.trim(), body.rating)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: ReviewDoc::from(row),
        meta: ResponseMeta::new(req_id.0),
    }))
}

/// DELETE /reviews/{id} — only the author may delete.
pub(in crate::api) async fn delete_review(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    storefront_db::delete_review(&state.pool, id, user.id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: serde_json::json!({ "deleted": true }),
        meta: ResponseMeta::new(req_id.0),
    }))
}
