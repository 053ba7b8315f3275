//! Account handlers: register, login, and the current-user profile.

use axum::{extract::State, http::StatusCode, Extension, Json};
use serde::{Deserialize, Serialize};
use storefront_db::UserRow;

use crate::middleware::{CurrentUser, RequestId};

use super::{is_sqlstate, map_db_error, ApiError, ApiResponse, AppState, ResponseMeta};

#[derive(Debug, Deserialize)]
pub(in crate::api) struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub(in crate::api) struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Public view of a user. The credential hash stays inside the db layer.
#[derive(Debug, Serialize)]
pub(in crate::api) struct UserDoc {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub is_admin: bool,
}

#[derive(Debug, Serialize)]
pub(in crate::api) struct LoginResponse {
    pub access: String,
    pub refresh: String,
    pub user: UserDoc,
}

impl From<UserRow> for UserDoc {
    fn from(row: UserRow) -> Self {
        Self {
            id: row.id,
            username: row.username,
            email: row.email,
            is_admin: row.is_admin,
        }
    }
}

fn validate_registration(req_id: &str, body: &RegisterRequest) -> Result<(), ApiError> {
    let username = body.username.trim();
    if username.is_empty() || username.len() > 150 {
        return Err(ApiError::new(
            req_id,
            "validation_error",
            "username must be 1-150 characters",
        ));
    }
    if !body.email.contains('@') {
        return Err(ApiError::new(
            req_id,
            "validation_error",
            "email must contain '@'",
        ));
    }
    if body.password.len() < 8 {
        return Err(ApiError::new(
            req_id,
            "validation_error",
            "password must be at least 8 characters",
        ));
    }
    Ok(())
}

/// POST /register/ — create an account.
pub(in crate::api) async fn register(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<ApiResponse<UserDoc>>), ApiError> {
    let rid = &req_id.0;
    validate_registration(rid, &body)?;

    let password_hash = storefront_core::hash_password(&body.password).map_err(|e| {
        tracing::error!(error = %e, "password hashing failed");
        ApiError::new(rid, "internal_error", "could not create account")
    })?;

    let row = storefront_db::create_user(
        &state.pool,
        body.username.trim(),
        body.email.trim(),
        &password_hash,
    )
    .await
    .map_err(|e| {
        if is_sqlstate(&e, "23505") {
            ApiError::new(rid, "validation_error", "username or email already in use")
        } else {
            map_db_error(rid.clone(), &e)
        }
    })?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse {
            data: UserDoc::from(row),
            meta: ResponseMeta::new(req_id.0),
        }),
    ))
}

/// POST /login/ — verify credentials and issue a token pair.
///
/// Unknown username and wrong password are deliberately indistinguishable
/// in the response.
pub(in crate::api) async fn login(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<LoginRequest>,
) -> Result<Json<ApiResponse<LoginResponse>>, ApiError> {
    let rid = &req_id.0;

    let user = storefront_db::get_user_by_username(&state.pool, body.username.trim())
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?;

    let Some(user) = user else {
        return Err(bad_credentials(rid));
    };
    if !storefront_core::verify_password(&body.password, &user.password_hash) {
        return Err(bad_credentials(rid));
    }

    let tokens = &state.tokens;
    let pair = storefront_core::issue_token_pair(
        &tokens.jwt_secret,
        user.id,
        &user.username,
        user.is_admin,
        tokens.access_ttl_minutes,
        tokens.refresh_ttl_minutes,
    )
    .map_err(|e| {
        tracing::error!(error = %e, "token issuance failed");
        ApiError::new(rid, "internal_error", "could not issue tokens")
    })?;

    Ok(Json(ApiResponse {
        data: LoginResponse {
            access: pair.access,
            refresh: pair.refresh,
            user: UserDoc::from(user),
        },
        meta: ResponseMeta::new(req_id.0),
    }))
}

fn bad_credentials(req_id: &str) -> ApiError {
    ApiError::new(req_id, "unauthorized", "invalid username or password")
}

/// GET /profile/ — the authenticated caller's account document.
pub(in crate::api) async fn profile(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Json<ApiResponse<UserDoc>>, ApiError> {
    let rid = &req_id.0;

    let row = storefront_db::get_user_by_id(&state.pool, user.id)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?
        .ok_or_else(|| ApiError::new(rid, "not_found", "record not found"))?;

    Ok(Json(ApiResponse {
        data: UserDoc::from(row),
        meta: ResponseMeta::new(req_id.0),
    }))
}
