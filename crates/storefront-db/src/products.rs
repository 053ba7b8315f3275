//! Database operations for the `products` table.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use crate::DbError;

/// A row from the `products` table.
///
/// `metadata` is a free-form JSON object; its shape is owned by the client.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ProductRow {
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

/// Returns all products ordered by base name.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_products(pool: &PgPool) -> Result<Vec<ProductRow>, DbError> {
    let rows = sqlx::query_as::<_, ProductRow>(
        "SELECT id, category_id, brand_id, base_name, description, base_price, \
                metadata, created_at, updated_at \
         FROM products \
         ORDER BY base_name, id",
    )
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Returns a single product by id, or `None` if not found.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_product(pool: &PgPool, product_id: i64) -> Result<Option<ProductRow>, DbError> {
    let row = sqlx::query_as::<_, ProductRow>(
        "SELECT id, category_id, brand_id, base_name, description, base_price, \
                metadata, created_at, updated_at \
         FROM products \
         WHERE id = $1",
    )
    .bind(product_id)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

/// Creates a new product and returns the full inserted row.
///
/// Foreign-key violations on category/brand surface as [`DbError::Sqlx`]
/// with SQLSTATE 23503; the caller maps those to a validation failure.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
pub async fn create_product(
    pool: &PgPool,
    category_id: Option<i64>,
    brand_id: Option<i64>,
    base_name: &str,
    description: &str,
    base_price: Decimal,
    metadata: &serde_json::Value,
) -> Result<ProductRow, DbError> {
    let row = sqlx::query_as::<_, ProductRow>(
        "INSERT INTO products (category_id, brand_id, base_name, description, base_price, metadata) \
         VALUES ($1, $2, $3, $4, $5, $6) \
         RETURNING id, category_id, brand_id, base_name, description, base_price, \
                   metadata, created_at, updated_at",
    )
    .bind(category_id)
    .bind(brand_id)
    .bind(base_name)
    .bind(description)
    .bind(base_price)
    .bind(metadata)
    .fetch_one(pool)
    .await?;
    Ok(row)
}

/// Replaces a product's fields and returns the updated row.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no product has the given id, or
/// [`DbError::Sqlx`] if the query fails.
#[allow(clippy::too_many_arguments)] // full-replace update mirrors the create signature
pub async fn update_product(
    pool: &PgPool,
    product_id: i64,
    category_id: Option<i64>,
    brand_id: Option<i64>,
    base_name: &str,
    description: &str,
    base_price: Decimal,
    metadata: &serde_json::Value,
) -> Result<ProductRow, DbError> {
    let row = sqlx::query_as::<_, ProductRow>(
        "UPDATE products \
         SET category_id = $2, brand_id = $3, base_name = $4, description = $5, \
             base_price = $6, metadata = $7, updated_at = NOW() \
         WHERE id = $1 \
         RETURNING id, category_id, brand_id, base_name, description, base_price, \
                   metadata, created_at, updated_at",
    )
    .bind(product_id)
    .bind(category_id)
    .bind(brand_id)
    .bind(base_name)
    .bind(description)
    .bind(base_price)
    .bind(metadata)
    .fetch_optional(pool)
    .await?;
    row.ok_or(DbError::NotFound)
}

/// Deletes a product; variants and other dependents cascade per the schema.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no product has the given id, or
/// [`DbError::Sqlx`] if the delete fails.
pub async fn delete_product(pool: &PgPool, product_id: i64) -> Result<(), DbError> {
    let affected = sqlx::query("DELETE FROM products WHERE id = $1")
        .bind(product_id)
        .execute(pool)
        .await?
        .rows_affected();
    if affected == 0 {
        return Err(DbError::NotFound);
    }
    Ok(())
}
