//! Database operations for the `brands` table.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::DbError;

/// A row from the `brands` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct BrandRow {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Returns all brands ordered by name.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_brands(pool: &PgPool) -> Result<Vec<BrandRow>, DbError> {
    let rows = sqlx::query_as::<_, BrandRow>(
        "SELECT id, name, description, created_at, updated_at \
         FROM brands \
         ORDER BY name",
    )
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Returns a single brand by id, or `None` if not found.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_brand(pool: &PgPool, brand_id: i64) -> Result<Option<BrandRow>, DbError> {
    let row = sqlx::query_as::<_, BrandRow>(
        "SELECT id, name, description, created_at, updated_at \
         FROM brands \
         WHERE id = $1",
    )
    .bind(brand_id)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

/// Creates a new brand and returns the full inserted row.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
pub async fn create_brand(
    pool: &PgPool,
    name: &str,
    description: &str,
) -> Result<BrandRow, DbError> {
    let row = sqlx::query_as::<_, BrandRow>(
        "INSERT INTO brands (name, description) \
         VALUES ($1, $2) \
         RETURNING id, name, description, created_at, updated_at",
    )
    .bind(name)
    .bind(description)
    .fetch_one(pool)
    .await?;
    Ok(row)
}

/// Replaces a brand's fields and returns the updated row.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no brand has the given id, or
/// [`DbError::Sqlx`] if the query fails.
pub async fn update_brand(
    pool: &PgPool,
    brand_id: i64,
    name: &str,
    description: &str,
) -> Result<BrandRow, DbError> {
    let row = sqlx::query_as::<_, BrandRow>(
        "UPDATE brands \
         SET name = $2, description = $3, updated_at = NOW() \
         WHERE id = $1 \
         RETURNING id, name, description, created_at, updated_at",
    )
    .bind(brand_id)
    .bind(name)
    .bind(description)
    .fetch_optional(pool)
    .await?;
    row.ok_or(DbError::NotFound)
}

/// Sparse update: `Some(v)` overwrites a field, `None` preserves it.
///
/// Uses `COALESCE` in a single `UPDATE … RETURNING` statement so there is no
/// race between a separate SELECT and UPDATE.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no brand has the given id, or
/// [`DbError::Sqlx`] if the query fails.
pub async fn update_brand_partial(
    pool: &PgPool,
    brand_id: i64,
    name: Option<&str>,
    description: Option<&str>,
) -> Result<BrandRow, DbError> {
    let row = sqlx::query_as::<_, BrandRow>(
        "UPDATE brands \
         SET name        = COALESCE($2, name), \
             description = COALESCE($3, description), \
             updated_at  = NOW() \
         WHERE id = $1 \
         RETURNING id, name, description, created_at, updated_at",
    )
    .bind(brand_id)
    .bind(name)
    .bind(description)
    .fetch_optional(pool)
    .await?;
    row.ok_or(DbError::NotFound)
}

/// Deletes a brand; dependents cascade per the schema.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no brand has the given id, or
/// [`DbError::Sqlx`] if the delete fails.
pub async fn delete_brand(pool: &PgPool, brand_id: i64) -> Result<(), DbError> {
    let affected = sqlx::query("DELETE FROM brands WHERE id = $1")
        .bind(brand_id)
        .execute(pool)
        .await?
        .rows_affected();
    if affected == 0 {
        return Err(DbError::NotFound);
    }
    Ok(())
}
