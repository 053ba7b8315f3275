//! Per-product dependent rows assembled by the product-detail read:
//! specifications, compatibilities, delivery time status, FAQs, and
//! carousel entries.

use rust_decimal::Decimal;
use sqlx::PgPool;

use crate::DbError;

/// A row from the `specifications` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SpecificationRow {
    pub id: i64,
    pub product_id: i64,
    pub name: String,
    pub value: String,
}

/// A row from the `compatibilities` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CompatibilityRow {
    pub id: i64,
    pub product_id: i64,
    pub name: String,
    pub product_type: String,
}

/// A row from the `delivery_time_statuses` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct DeliveryTimeStatusRow {
    pub id: i64,
    pub product_id: i64,
    pub shipping_cost: Decimal,
    pub estimated_delivery_time: String,
    pub additional_info: String,
}

/// A row from the `faqs` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct FaqRow {
    pub id: i64,
    pub product_id: i64,
    pub question: String,
    pub answer: String,
}

/// A row from the `carousels` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CarouselRow {
    pub id: i64,
    pub product_id: i64,
    pub image: String,
    pub title: String,
    pub description: String,
    pub sort_order: Option<i32>,
}

/// Returns all specifications of a product ordered by id.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_specifications(
    pool: &PgPool,
    product_id: i64,
) -> Result<Vec<SpecificationRow>, DbError> {
    let rows = sqlx::query_as::<_, SpecificationRow>(
        "SELECT id, product_id, name, value \
         FROM specifications \
         WHERE product_id = $1 \
         ORDER BY id",
    )
    .bind(product_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Returns all compatibility entries of a product ordered by id.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_compatibilities(
    pool: &PgPool,
    product_id: i64,
) -> Result<Vec<CompatibilityRow>, DbError> {
    let rows = sqlx::query_as::<_, CompatibilityRow>(
        "SELECT id, product_id, name, product_type \
         FROM compatibilities \
         WHERE product_id = $1 \
         ORDER BY id",
    )
    .bind(product_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Returns the delivery time status of a product, or `None` if absent.
///
/// The relation is modeled 1-to-1 but the schema does not enforce it;
/// when multiple rows exist the first (lowest id) wins and the condition
/// is logged rather than failing the read.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_delivery_time_status(
    pool: &PgPool,
    product_id: i64,
) -> Result<Option<DeliveryTimeStatusRow>, DbError> {
    let rows = sqlx::query_as::<_, DeliveryTimeStatusRow>(
        "SELECT id, product_id, shipping_cost, estimated_delivery_time, additional_info \
         FROM delivery_time_statuses \
         WHERE product_id = $1 \
         ORDER BY id",
    )
    .bind(product_id)
    .fetch_all(pool)
    .await?;

    if rows.len() > 1 {
        tracing::warn!(
            product_id,
            count = rows.len(),
            "multiple delivery_time_statuses rows for one product; using the first"
        );
    }
    Ok(rows.into_iter().next())
}

/// Returns all FAQs of a product ordered by id.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_faqs(pool: &PgPool, product_id: i64) -> Result<Vec<FaqRow>, DbError> {
    let rows = sqlx::query_as::<_, FaqRow>(
        "SELECT id, product_id, question, answer \
         FROM faqs \
         WHERE product_id = $1 \
         ORDER BY id",
    )
    .bind(product_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Returns a product's carousel entries in display order.
///
/// Entries with an explicit `sort_order` come first (ascending); entries
/// without one sort after them, stably by id.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_carousel_entries(
    pool: &PgPool,
    product_id: i64,
) -> Result<Vec<CarouselRow>, DbError> {
    let rows = sqlx::query_as::<_, CarouselRow>(
        "SELECT id, product_id, image, title, description, sort_order \
         FROM carousels \
         WHERE product_id = $1 \
         ORDER BY sort_order ASC NULLS LAST, id ASC",
    )
    .bind(product_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Inserts a specification row. Used by seeding and admin tooling.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
pub async fn create_specification(
    pool: &PgPool,
    product_id: i64,
    name: &str,
    value: &str,
) -> Result<SpecificationRow, DbError> {
    let row = sqlx::query_as::<_, SpecificationRow>(
        "INSERT INTO specifications (product_id, name, value) \
         VALUES ($1, $2, $3) \
         RETURNING id, product_id, name, value",
    )
    .bind(product_id)
    .bind(name)
    .bind(value)
    .fetch_one(pool)
    .await?;
    Ok(row)
}

/// Inserts a compatibility row. Used by seeding and admin tooling.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
pub async fn create_compatibility(
    pool: &PgPool,
    product_id: i64,
    name: &str,
    product_type: &str,
) -> Result<CompatibilityRow, DbError> {
    let row = sqlx::query_as::<_, CompatibilityRow>(
        "INSERT INTO compatibilities (product_id, name, product_type) \
         VALUES ($1, $2, $3) \
         RETURNING id, product_id, name, product_type",
    )
    .bind(product_id)
    .bind(name)
    .bind(product_type)
    .fetch_one(pool)
    .await?;
    Ok(row)
}
