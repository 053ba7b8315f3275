//! Database operations for the `variants`, `images`, and `variant_images`
//! tables.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use crate::DbError;

/// A row from the `variants` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct VariantRow {
    pub id: i64,
    pub product_id: i64,
    pub name: String,
    pub price: Decimal,
    pub color: String,
    pub stock: i32,
    pub size: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// An image row joined with the variant it belongs to.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct VariantImageRow {
    pub variant_id: i64,
    pub image_id: i64,
    pub url: String,
}

/// Returns a variant by id, or `None` if not found.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_variant(pool: &PgPool, variant_id: i64) -> Result<Option<VariantRow>, DbError> {
    let row = sqlx::query_as::<_, VariantRow>(
        "SELECT id, product_id, name, price, color, stock, size, created_at, updated_at \
         FROM variants \
         WHERE id = $1",
    )
    .bind(variant_id)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

/// Returns all variants of a product ordered by id.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_variants_for_product(
    pool: &PgPool,
    product_id: i64,
) -> Result<Vec<VariantRow>, DbError> {
    let rows = sqlx::query_as::<_, VariantRow>(
        "SELECT id, product_id, name, price, color, stock, size, created_at, updated_at \
         FROM variants \
         WHERE product_id = $1 \
         ORDER BY id",
    )
    .bind(product_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Returns the images of every variant in `variant_ids`, grouped by the
/// caller. One round-trip for the whole product-detail read.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_images_for_variants(
    pool: &PgPool,
    variant_ids: &[i64],
) -> Result<Vec<VariantImageRow>, DbError> {
    if variant_ids.is_empty() {
        return Ok(Vec::new());
    }
    let rows = sqlx::query_as::<_, VariantImageRow>(
        "SELECT vi.variant_id, i.id AS image_id, i.url \
         FROM variant_images vi \
         JOIN images i ON i.id = vi.image_id \
         WHERE vi.variant_id = ANY($1) \
         ORDER BY vi.variant_id, i.id",
    )
    .bind(variant_ids)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Creates a new variant and returns the full inserted row.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails (including FK violations
/// against `products`).
pub async fn create_variant(
    pool: &PgPool,
    product_id: i64,
    name: &str,
    price: Decimal,
    color: &str,
    stock: i32,
    size: &str,
) -> Result<VariantRow, DbError> {
    let row = sqlx::query_as::<_, VariantRow>(
        "INSERT INTO variants (product_id, name, price, color, stock, size) \
         VALUES ($1, $2, $3, $4, $5, $6) \
         RETURNING id, product_id, name, price, color, stock, size, created_at, updated_at",
    )
    .bind(product_id)
    .bind(name)
    .bind(price)
    .bind(color)
    .bind(stock)
    .bind(size)
    .fetch_one(pool)
    .await?;
    Ok(row)
}

/// Replaces a variant's fields and returns the updated row.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no variant has the given id, or
/// [`DbError::Sqlx`] if the query fails.
pub async fn update_variant(
    pool: &PgPool,
    variant_id: i64,
    name: &str,
    price: Decimal,
    color: &str,
    stock: i32,
    size: &str,
) -> Result<VariantRow, DbError> {
    let row = sqlx::query_as::<_, VariantRow>(
        "UPDATE variants \
         SET name = $2, price = $3, color = $4, stock = $5, size = $6, updated_at = NOW() \
         WHERE id = $1 \
         RETURNING id, product_id, name, price, color, stock, size, created_at, updated_at",
    )
    .bind(variant_id)
    .bind(name)
    .bind(price)
    .bind(color)
    .bind(stock)
    .bind(size)
    .fetch_optional(pool)
    .await?;
    row.ok_or(DbError::NotFound)
}

/// Deletes a variant.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no variant has the given id, or
/// [`DbError::Sqlx`] if the delete fails.
pub async fn delete_variant(pool: &PgPool, variant_id: i64) -> Result<(), DbError> {
    let affected = sqlx::query("DELETE FROM variants WHERE id = $1")
        .bind(variant_id)
        .execute(pool)
        .await?
        .rows_affected();
    if affected == 0 {
        return Err(DbError::NotFound);
    }
    Ok(())
}

/// Inserts an image URL and links it to a variant in one transaction.
///
/// Returns the new image id.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if the variant does not exist, or
/// [`DbError::Sqlx`] if either insert fails.
pub async fn attach_variant_image(
    pool: &PgPool,
    variant_id: i64,
    url: &str,
) -> Result<i64, DbError> {
    let mut tx = pool.begin().await?;

    let exists: Option<i64> = sqlx::query_scalar("SELECT id FROM variants WHERE id = $1")
        .bind(variant_id)
        .fetch_optional(&mut *tx)
        .await?;
    if exists.is_none() {
        return Err(DbError::NotFound);
    }

    let image_id: i64 = sqlx::query_scalar("INSERT INTO images (url) VALUES ($1) RETURNING id")
        .bind(url)
        .fetch_one(&mut *tx)
        .await?;

    sqlx::query("INSERT INTO variant_images (variant_id, image_id) VALUES ($1, $2)")
        .bind(variant_id)
        .bind(image_id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    Ok(image_id)
}
