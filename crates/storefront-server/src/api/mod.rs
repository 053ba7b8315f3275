mod auth;
mod brands;
mod cart;
mod categories;
mod orders;
mod product_detail;
mod products;
mod reviews;
mod tags;
mod variants;

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::State,
    http::{header, HeaderName, Method, StatusCode},
    response::IntoResponse,
    routing::{get, post, put},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;

use crate::middleware::{
    enforce_rate_limit, request_id, require_bearer_auth, AuthState, RateLimitState,
};

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub tokens: TokenConfig,
}

/// JWT issuance settings used by the login handler.
#[derive(Clone)]
pub struct TokenConfig {
    pub jwt_secret: Arc<String>,
    pub access_ttl_minutes: i64,
    pub refresh_ttl_minutes: i64,
}

#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ResponseMeta {
    pub request_id: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: ErrorBody,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

// The health body deliberately skips the envelope; it is consumed by load
// balancers and uptime probes that expect this exact shape.
#[derive(Debug, Serialize, PartialEq, Eq)]
struct HealthBody {
    status: &'static str,
    message: &'static str,
}

impl ResponseMeta {
    pub(super) fn new(request_id: String) -> Self {
        Self {
            request_id,
            timestamp: Utc::now(),
        }
    }
}

impl ApiError {
    pub fn new(
        request_id: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            error: ErrorBody {
                code: code.into(),
                message: message.into(),
            },
            meta: ResponseMeta::new(request_id.into()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = match self.error.code.as_str() {
            "not_found" => StatusCode::NOT_FOUND,
            "unauthorized" => StatusCode::UNAUTHORIZED,
            "bad_request" | "validation_error" => StatusCode::BAD_REQUEST,
            "conflict" => StatusCode::CONFLICT,
            "rate_limited" => StatusCode::TOO_MANY_REQUESTS,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(self)).into_response()
    }
}

/// Translate a database error into the API error vocabulary.
///
/// Domain conditions keep their meaning (missing row, empty cart, stock,
/// illegal transition); everything else is an opaque internal error so
/// driver details never leak to clients.
pub(super) fn map_db_error(request_id: String, error: &storefront_db::DbError) -> ApiError {
    use storefront_db::DbError;
    match error {
        DbError::NotFound => ApiError::new(request_id, "not_found", "record not found"),
        DbError::EmptyCart => ApiError::new(request_id, "bad_request", "cart is empty"),
        DbError::InsufficientStock { variant_id } => ApiError::new(
            request_id,
            "validation_error",
            format!("insufficient stock for variant {variant_id}"),
        ),
        DbError::InvalidTransition { from, to } => ApiError::new(
            request_id,
            "conflict",
            format!("cannot move order from '{from}' to '{to}'"),
        ),
        _ => {
            tracing::error!(error = %error, "database query failed");
            ApiError::new(request_id, "internal_error", "database query failed")
        }
    }
}

/// True when the error is a Postgres error carrying the given SQLSTATE.
pub(super) fn is_sqlstate(error: &storefront_db::DbError, state: &str) -> bool {
    if let storefront_db::DbError::Sqlx(sqlx::Error::Database(db_err)) = error {
        return db_err.code().as_deref() == Some(state);
    }
    false
}

fn build_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
        ])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            HeaderName::from_static("x-request-id"),
        ])
}

fn protected_router(auth: AuthState, rate_limit: RateLimitState) -> Router<AppState> {
    Router::new()
        .route("/profile/", get(auth::profile))
        .route(
            "/categories/",
            get(categories::list_categories).post(categories::create_category),
        )
        .route(
            "/category-detail/{id}",
            get(categories::get_category)
                .put(categories::update_category)
                .delete(categories::delete_category),
        )
        .route(
            "/brands/",
            get(brands::list_brands).post(brands::create_brand),
        )
        .route(
            "/brand-detail/{id}",
            get(brands::get_brand)
                .put(brands::update_brand)
                .delete(brands::delete_brand),
        )
        .route("/brand-partial-update/{id}", put(brands::partial_update_brand))
        .route(
            "/products/",
            get(products::list_products).post(products::create_product),
        )
        .route(
            "/products/{id}",
            get(products::get_product)
                .put(products::update_product)
                .delete(products::delete_product),
        )
        .route("/product-detail/{id}", get(product_detail::get_product_detail))
        .route(
            "/products/{id}/variants/",
            get(variants::list_variants).post(variants::create_variant),
        )
        .route(
            "/variants/{id}",
            put(variants::update_variant).delete(variants::delete_variant),
        )
        .route("/variants/{id}/images/", post(variants::attach_image))
        .route(
            "/products/{id}/reviews/",
            get(reviews::list_reviews).post(reviews::create_review),
        )
        .route(
            "/reviews/{id}",
            get(reviews::get_review)
                .put(reviews::update_review)
                .delete(reviews::delete_review),
        )
        .route(
            "/products/{id}/tags/",
            get(tags::list_tags).post(tags::create_tag),
        )
        .route(
            "/tags/{id}",
            get(tags::get_tag).put(tags::update_tag).delete(tags::delete_tag),
        )
        .route("/cart/", get(cart::get_cart))
        .route("/cart/items/", post(cart::add_item))
        .route(
            "/cart/items/{id}",
            put(cart::update_item).delete(cart::remove_item),
        )
        .route("/checkout/", post(orders::checkout))
        .route("/orders/", get(orders::list_orders))
        .route("/orders/{id}", get(orders::get_order))
        .route("/orders/{id}/status", put(orders::update_status))
        .layer(
            ServiceBuilder::new()
                .layer(axum::middleware::from_fn_with_state(
                    rate_limit,
                    enforce_rate_limit,
                ))
                .layer(axum::middleware::from_fn_with_state(
                    auth,
                    require_bearer_auth,
                )),
        )
}

pub fn build_app(state: AppState, auth: AuthState, rate_limit: RateLimitState) -> Router {
    let public_routes = Router::new()
        .route("/health/", get(health))
        .route("/register/", post(auth::register))
        .route("/login/", post(auth::login));

    Router::new()
        .merge(public_routes)
        .merge(protected_router(auth, rate_limit))
        .layer(
            ServiceBuilder::new()
                .layer(build_cors())
                .layer(axum::middleware::from_fn(request_id)),
        )
        .with_state(state)
}

async fn health(State(state): State<AppState>) -> impl IntoResponse {
    match storefront_db::health_check(&state.pool).await {
        Ok(()) => (
            StatusCode::OK,
            Json(HealthBody {
                status: "healthy",
                message: "The API is up and running.",
            }),
        ),
        Err(e) => {
            tracing::warn!(error = %e, "health check: database unavailable");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(HealthBody {
                    status: "degraded",
                    message: "The API is unable to reach the database.",
                }),
            )
        }
    }
}

pub fn default_rate_limit_state() -> RateLimitState {
    RateLimitState::new(120, Duration::from_secs(60))
}

#[cfg(test)]
mod tests {
    use super::product_detail::ProductDetailDoc;
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use rust_decimal::Decimal;
    use tower::ServiceExt;

    const TEST_SECRET: &str = "integration-test-secret-32-chars!!!!";

    fn test_app(pool: PgPool) -> Router {
        let jwt_secret = Arc::new(TEST_SECRET.to_string());
        let tokens = TokenConfig {
            jwt_secret: Arc::clone(&jwt_secret),
            access_ttl_minutes: 60,
            refresh_ttl_minutes: 10080,
        };
        build_app(
            AppState { pool, tokens },
            AuthState::new(jwt_secret),
            default_rate_limit_state(),
        )
    }

    /// One request against a clone of the router; parses the body as JSON
    /// when there is one.
    async fn send(
        app: &Router,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<serde_json::Value>,
    ) -> (StatusCode, serde_json::Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {token}"));
        }
        let request = match body {
            Some(json) => builder
                .header("content-type", "application/json")
                .body(Body::from(json.to_string()))
                .expect("request"),
            None => builder.body(Body::empty()).expect("request"),
        };

        let response = app.clone().oneshot(request).await.expect("response");
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body bytes");
        let json = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
        (status, json)
    }

    /// Register a user through the API and log in; returns the access token.
    async fn register_and_login(app: &Router, username: &str) -> String {
        let (status, _) = send(
            app,
            "POST",
            "/register/",
            None,
            Some(serde_json::json!({
                "username": username,
                "email": format!("{username}@example.com"),
                "password": "correct horse battery",
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED, "register should succeed");

        let (status, body) = send(
            app,
            "POST",
            "/login/",
            None,
            Some(serde_json::json!({
                "username": username,
                "password": "correct horse battery",
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "login should succeed");
        body["data"]["access"]
            .as_str()
            .expect("access token")
            .to_owned()
    }

    // -------------------------------------------------------------------------
    // Serialization unit tests (no DB)
    // -------------------------------------------------------------------------

    #[test]
    fn health_body_has_exact_probe_shape() {
        let body = HealthBody {
            status: "healthy",
            message: "The API is up and running.",
        };
        let json = serde_json::to_string(&body).expect("serialize");
        assert_eq!(
            json,
            r#"{"status":"healthy","message":"The API is up and running."}"#
        );
    }

    #[test]
    fn prices_serialize_as_decimal_strings() {
        let doc = ProductDetailDoc::sample_for_tests(Decimal::new(4999, 2));
        let json = serde_json::to_string(&doc).expect("serialize");
        assert!(
            json.contains("\"base_price\":\"49.99\""),
            "decimals must render as strings, got: {json}"
        );
    }

    #[test]
    fn product_detail_doc_renders_null_delivery_status() {
        let doc = ProductDetailDoc::sample_for_tests(Decimal::new(4999, 2));
        let json: serde_json::Value =
            serde_json::to_value(&doc).expect("serialize ProductDetailDoc");
        assert!(json["delivery_time_status"].is_null());
        assert!(json["variants"].is_array());
    }

    #[test]
    fn api_error_validation_error_maps_to_bad_request() {
        let response = ApiError::new("req-1", "validation_error", "invalid input").into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn api_error_conflict_maps_to_409() {
        let response = ApiError::new("req-1", "conflict", "illegal transition").into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn db_domain_errors_keep_their_meaning() {
        use storefront_db::DbError;

        let not_found = map_db_error("r".into(), &DbError::NotFound);
        assert_eq!(not_found.error.code, "not_found");

        let empty = map_db_error("r".into(), &DbError::EmptyCart);
        assert_eq!(empty.error.code, "bad_request");

        let stock = map_db_error("r".into(), &DbError::InsufficientStock { variant_id: 7 });
        assert_eq!(stock.error.code, "validation_error");

        let transition = map_db_error(
            "r".into(),
            &DbError::InvalidTransition {
                from: "delivered".into(),
                to: "pending".into(),
            },
        );
        assert_eq!(transition.error.code, "conflict");
    }

    // -------------------------------------------------------------------------
    // Health and auth (with DB)
    // -------------------------------------------------------------------------

    #[sqlx::test(migrations = "../../migrations")]
    async fn health_reports_healthy_with_exact_body(pool: PgPool) {
        let app = test_app(pool);
        let (status, body) = send(&app, "GET", "/health/", None, None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"].as_str(), Some("healthy"));
        assert_eq!(
            body["message"].as_str(),
            Some("The API is up and running.")
        );
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn non_get_on_health_is_method_not_allowed(pool: PgPool) {
        let app = test_app(pool);
        let (status, _) = send(&app, "POST", "/health/", None, None).await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn register_never_echoes_the_password(pool: PgPool) {
        let app = test_app(pool);
        let (status, body) = send(
            &app,
            "POST",
            "/register/",
            None,
            Some(serde_json::json!({
                "username": "ada",
                "email": "ada@example.com",
                "password": "hunter2hunter2",
            })),
        )
        .await;

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["data"]["username"].as_str(), Some("ada"));
        let raw = body.to_string();
        assert!(!raw.contains("hunter2"), "password leaked: {raw}");
        assert!(!raw.contains("password"), "password field leaked: {raw}");
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn duplicate_username_is_a_validation_error(pool: PgPool) {
        let app = test_app(pool);
        let body = serde_json::json!({
            "username": "ada",
            "email": "ada@example.com",
            "password": "hunter2hunter2",
        });
        let (status, _) = send(&app, "POST", "/register/", None, Some(body.clone())).await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, error) = send(&app, "POST", "/register/", None, Some(body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(error["error"]["code"].as_str(), Some("validation_error"));
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn login_with_bad_password_is_unauthorized(pool: PgPool) {
        let app = test_app(pool);
        register_and_login(&app, "ada").await;

        let (status, body) = send(
            &app,
            "POST",
            "/login/",
            None,
            Some(serde_json::json!({"username": "ada", "password": "wrong"})),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"]["code"].as_str(), Some("unauthorized"));
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn protected_routes_reject_missing_tokens(pool: PgPool) {
        let app = test_app(pool);
        let (status, body) = send(&app, "GET", "/categories/", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"]["code"].as_str(), Some("unauthorized"));
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn profile_returns_the_authenticated_user(pool: PgPool) {
        let app = test_app(pool);
        let token = register_and_login(&app, "grace").await;

        let (status, body) = send(&app, "GET", "/profile/", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["username"].as_str(), Some("grace"));
        assert_eq!(body["data"]["email"].as_str(), Some("grace@example.com"));
    }

    // -------------------------------------------------------------------------
    // Catalog CRUD (with DB)
    // -------------------------------------------------------------------------

    #[sqlx::test(migrations = "../../migrations")]
    async fn category_crud_round_trip(pool: PgPool) {
        let app = test_app(pool);
        let token = register_and_login(&app, "admin").await;

        let (status, created) = send(
            &app,
            "POST",
            "/categories/",
            Some(&token),
            Some(serde_json::json!({"name": "Tools", "description": "Hand and power tools"})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let id = created["data"]["id"].as_i64().expect("category id");

        let (status, fetched) =
            send(&app, "GET", &format!("/category-detail/{id}"), Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(fetched["data"]["name"].as_str(), Some("Tools"));

        let (status, updated) = send(
            &app,
            "PUT",
            &format!("/category-detail/{id}"),
            Some(&token),
            Some(serde_json::json!({"name": "Power Tools", "description": "Power tools only"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["data"]["name"].as_str(), Some("Power Tools"));

        let (status, _) =
            send(&app, "DELETE", &format!("/category-detail/{id}"), Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);

        let (status, _) =
            send(&app, "GET", &format!("/category-detail/{id}"), Some(&token), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn brand_partial_update_preserves_unsent_fields(pool: PgPool) {
        let app = test_app(pool);
        let token = register_and_login(&app, "admin").await;

        let (_, created) = send(
            &app,
            "POST",
            "/brands/",
            Some(&token),
            Some(serde_json::json!({"name": "Acme", "description": "Everything brand"})),
        )
        .await;
        let id = created["data"]["id"].as_i64().expect("brand id");

        let (status, updated) = send(
            &app,
            "PUT",
            &format!("/brand-partial-update/{id}"),
            Some(&token),
            Some(serde_json::json!({"description": "Tools since 1949"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["data"]["name"].as_str(), Some("Acme"));
        assert_eq!(
            updated["data"]["description"].as_str(),
            Some("Tools since 1949")
        );
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn product_create_rejects_unknown_category(pool: PgPool) {
        let app = test_app(pool);
        let token = register_and_login(&app, "admin").await;

        let (status, body) = send(
            &app,
            "POST",
            "/products/",
            Some(&token),
            Some(serde_json::json!({
                "category_id": 999_999,
                "base_name": "Drill",
                "base_price": "49.99",
            })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"].as_str(), Some("validation_error"));
    }

    /// Seed a product with nested rows through the API; returns
    /// (product id, variant ids).
    async fn seed_product_via_api(app: &Router, token: &str) -> (i64, Vec<i64>) {
        let (_, category) = send(
            app,
            "POST",
            "/categories/",
            Some(token),
            Some(serde_json::json!({"name": "Tools", "description": "Tools"})),
        )
        .await;
        let (_, brand) = send(
            app,
            "POST",
            "/brands/",
            Some(token),
            Some(serde_json::json!({"name": "Acme", "description": "Acme"})),
        )
        .await;
        let (status, product) = send(
            app,
            "POST",
            "/products/",
            Some(token),
            Some(serde_json::json!({
                "category_id": category["data"]["id"],
                "brand_id": brand["data"]["id"],
                "base_name": "Drill",
                "description": "Cordless drill",
                "base_price": "49.99",
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let product_id = product["data"]["id"].as_i64().expect("product id");

        let mut variant_ids = Vec::new();
        for (name, price, stock) in [("18V", "44.99", 3), ("24V", "59.99", 5)] {
            let (status, variant) = send(
                app,
                "POST",
                &format!("/products/{product_id}/variants/"),
                Some(token),
                Some(serde_json::json!({
                    "name": name,
                    "price": price,
                    "color": "black",
                    "stock": stock,
                    "size": "standard",
                })),
            )
            .await;
            assert_eq!(status, StatusCode::CREATED);
            variant_ids.push(variant["data"]["id"].as_i64().expect("variant id"));
        }
        (product_id, variant_ids)
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn product_detail_aggregates_only_matching_rows(pool: PgPool) {
        let app = test_app(pool.clone());
        let token = register_and_login(&app, "admin").await;
        let (product_id, variant_ids) = seed_product_via_api(&app, &token).await;

        for (name, value) in [("Voltage", "18V"), ("Weight", "1.2kg"), ("Chuck", "13mm")] {
            sqlx::query("INSERT INTO specifications (product_id, name, value) VALUES ($1, $2, $3)")
                .bind(product_id)
                .bind(name)
                .bind(value)
                .execute(&pool)
                .await
                .expect("insert specification");
        }

        let (status, image) = send(
            &app,
            "POST",
            &format!("/variants/{}/images/", variant_ids[0]),
            Some(&token),
            Some(serde_json::json!({"url": "https://cdn.example.com/drill.jpg"})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert!(image["data"]["image_id"].as_i64().is_some());

        let (status, body) = send(
            &app,
            "GET",
            &format!("/product-detail/{product_id}"),
            Some(&token),
            None,
        )
        .await;

        assert_eq!(status, StatusCode::OK, "aggregation must not fail: {body}");
        let data = &body["data"];
        assert_eq!(data["base_name"].as_str(), Some("Drill"));
        assert_eq!(data["category"]["name"].as_str(), Some("Tools"));
        assert_eq!(data["brand"]["name"].as_str(), Some("Acme"));
        assert_eq!(data["variants"].as_array().map(Vec::len), Some(2));
        assert_eq!(data["specifications"].as_array().map(Vec::len), Some(3));
        assert!(
            data["delivery_time_status"].is_null(),
            "no delivery rows were seeded"
        );
        assert_eq!(
            data["variants"][0]["images"][0]["url"].as_str(),
            Some("https://cdn.example.com/drill.jpg")
        );
        assert_eq!(data["variants"][1]["images"].as_array().map(Vec::len), Some(0));
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn product_detail_unknown_product_is_404(pool: PgPool) {
        let app = test_app(pool);
        let token = register_and_login(&app, "admin").await;

        let (status, body) =
            send(&app, "GET", "/product-detail/999999", Some(&token), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["code"].as_str(), Some("not_found"));
    }

    // -------------------------------------------------------------------------
    // Cart and checkout (with DB)
    // -------------------------------------------------------------------------

    #[sqlx::test(migrations = "../../migrations")]
    async fn cart_and_checkout_snapshot_prices(pool: PgPool) {
        let app = test_app(pool.clone());
        let token = register_and_login(&app, "shopper").await;
        let (_, variant_ids) = seed_product_via_api(&app, &token).await;
        let variant_id = variant_ids[0];

        let (status, item) = send(
            &app,
            "POST",
            "/cart/items/",
            Some(&token),
            Some(serde_json::json!({"variant_id": variant_id, "quantity": 2})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(item["data"]["quantity"].as_i64(), Some(2));

        let (status, cart) = send(&app, "GET", "/cart/", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(cart["data"]["items"].as_array().map(Vec::len), Some(1));
        assert_eq!(cart["data"]["total"].as_str(), Some("89.98"));

        let (status, order) = send(&app, "POST", "/checkout/", Some(&token), None).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(order["data"]["status"].as_str(), Some("pending"));
        assert_eq!(order["data"]["total_amount"].as_str(), Some("89.98"));
        let order_id = order["data"]["id"].as_i64().expect("order id");

        let (status, detail) =
            send(&app, "GET", &format!("/orders/{order_id}"), Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(detail["data"]["items"][0]["price"].as_str(), Some("44.99"));

        let stock: i32 = sqlx::query_scalar("SELECT stock FROM variants WHERE id = $1")
            .bind(variant_id)
            .fetch_one(&pool)
            .await
            .expect("stock");
        assert_eq!(stock, 1, "checkout must decrement stock 3 -> 1");

        let (_, cart) = send(&app, "GET", "/cart/", Some(&token), None).await;
        assert_eq!(
            cart["data"]["items"].as_array().map(Vec::len),
            Some(0),
            "checkout clears the cart"
        );
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn add_to_cart_beyond_stock_is_rejected(pool: PgPool) {
        let app = test_app(pool);
        let token = register_and_login(&app, "shopper").await;
        let (_, variant_ids) = seed_product_via_api(&app, &token).await;

        // 18V variant has stock 3; 2 + 2 accumulated exceeds it.
        let body = serde_json::json!({"variant_id": variant_ids[0], "quantity": 2});
        let (status, _) = send(&app, "POST", "/cart/items/", Some(&token), Some(body.clone())).await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, error) = send(&app, "POST", "/cart/items/", Some(&token), Some(body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(error["error"]["code"].as_str(), Some("validation_error"));
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn checkout_of_empty_cart_is_bad_request(pool: PgPool) {
        let app = test_app(pool);
        let token = register_and_login(&app, "shopper").await;

        let (status, body) = send(&app, "POST", "/checkout/", Some(&token), None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"].as_str(), Some("bad_request"));
    }

    // -------------------------------------------------------------------------
    // Order status transitions (with DB)
    // -------------------------------------------------------------------------

    #[sqlx::test(migrations = "../../migrations")]
    async fn order_status_follows_the_state_machine(pool: PgPool) {
        let app = test_app(pool);
        let token = register_and_login(&app, "shopper").await;
        let (_, variant_ids) = seed_product_via_api(&app, &token).await;

        send(
            &app,
            "POST",
            "/cart/items/",
            Some(&token),
            Some(serde_json::json!({"variant_id": variant_ids[0], "quantity": 1})),
        )
        .await;
        let (_, order) = send(&app, "POST", "/checkout/", Some(&token), None).await;
        let order_id = order["data"]["id"].as_i64().expect("order id");
        let status_uri = format!("/orders/{order_id}/status");

        // Skipping ahead from pending is a conflict.
        let (status, body) = send(
            &app,
            "PUT",
            &status_uri,
            Some(&token),
            Some(serde_json::json!({"status": "delivered"})),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"]["code"].as_str(), Some("conflict"));

        let (status, body) = send(
            &app,
            "PUT",
            &status_uri,
            Some(&token),
            Some(serde_json::json!({"status": "processing"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["status"].as_str(), Some("processing"));

        let (status, body) = send(
            &app,
            "PUT",
            &status_uri,
            Some(&token),
            Some(serde_json::json!({"status": "not-a-status"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"].as_str(), Some("validation_error"));
    }

    // -------------------------------------------------------------------------
    // Reviews and tags (with DB)
    // -------------------------------------------------------------------------

    #[sqlx::test(migrations = "../../migrations")]
    async fn review_author_is_the_authenticated_caller(pool: PgPool) {
        let app = test_app(pool);
        let token = register_and_login(&app, "critic").await;
        let (product_id, _) = seed_product_via_api(&app, &token).await;

        let (status, review) = send(
            &app,
            "POST",
            &format!("/products/{product_id}/reviews/"),
            Some(&token),
            Some(serde_json::json!({"comment": "Solid drill.", "rating": 5})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(review["data"]["reviewer"].as_str(), Some("critic"));
        let review_id = review["data"]["id"].as_i64().expect("review id");

        // A different user cannot edit someone else's review.
        let other = register_and_login(&app, "stranger").await;
        let (status, _) = send(
            &app,
            "PUT",
            &format!("/reviews/{review_id}"),
            Some(&other),
            Some(serde_json::json!({"comment": "Hijacked.", "rating": 1})),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, body) = send(
            &app,
            "POST",
            &format!("/products/{product_id}/reviews/"),
            Some(&token),
            Some(serde_json::json!({"comment": "Out of range.", "rating": 6})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"].as_str(), Some("validation_error"));
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn tags_attach_to_their_product(pool: PgPool) {
        let app = test_app(pool);
        let token = register_and_login(&app, "admin").await;
        let (product_id, _) = seed_product_via_api(&app, &token).await;

        for name in ["cordless", "diy"] {
            let (status, _) = send(
                &app,
                "POST",
                &format!("/products/{product_id}/tags/"),
                Some(&token),
                Some(serde_json::json!({"tag_name": name})),
            )
            .await;
            assert_eq!(status, StatusCode::CREATED);
        }

        let (status, body) = send(
            &app,
            "GET",
            &format!("/products/{product_id}/tags/"),
            Some(&token),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let names: Vec<&str> = body["data"]
            .as_array()
            .expect("tags array")
            .iter()
            .filter_map(|t| t["tag_name"].as_str())
            .collect();
        assert_eq!(names, vec!["cordless", "diy"]);
    }
}
