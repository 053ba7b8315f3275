//! Database operations for the `tags` table.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::DbError;

/// A row from the `tags` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct TagRow {
    pub id: i64,
    pub product_id: i64,
    pub tag_name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Returns all tags of a product ordered by name.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_tags_for_product(pool: &PgPool, product_id: i64) -> Result<Vec<TagRow>, DbError> {
    let rows = sqlx::query_as::<_, TagRow>(
        "SELECT id, product_id, tag_name, created_at, updated_at \
         FROM tags \
         WHERE product_id = $1 \
         ORDER BY tag_name, id",
    )
    .bind(product_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Returns a tag by id, or `None` if not found.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_tag(pool: &PgPool, tag_id: i64) -> Result<Option<TagRow>, DbError> {
    let row = sqlx::query_as::<_, TagRow>(
        "SELECT id, product_id, tag_name, created_at, updated_at \
         FROM tags \
         WHERE id = $1",
    )
    .bind(tag_id)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

/// Creates a tag and returns the full inserted row.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
pub async fn create_tag(pool: &PgPool, product_id: i64, tag_name: &str) -> Result<TagRow, DbError> {
    let row = sqlx::query_as::<_, TagRow>(
        "INSERT INTO tags (product_id, tag_name) \
         VALUES ($1, $2) \
         RETURNING id, product_id, tag_name, created_at, updated_at",
    )
    .bind(product_id)
    .bind(tag_name)
    .fetch_one(pool)
    .await?;
    Ok(row)
}

/// Renames a tag and returns the updated row.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no tag has the given id, or
/// [`DbError::Sqlx`] if the query fails.
pub async fn update_tag(pool: &PgPool, tag_id: i64, tag_name: &str) -> Result<TagRow, DbError> {
    let row = sqlx::query_as::<_, TagRow>(
        "UPDATE tags \
         SET tag_name = $2, updated_at = NOW() \
         WHERE id = $1 \
         RETURNING id, product_id, tag_name, created_at, updated_at",
    )
    .bind(tag_id)
    .bind(tag_name)
    .fetch_optional(pool)
    .await?;
    row.ok_or(DbError::NotFound)
}

/// Deletes a tag.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no tag has the given id, or
/// [`DbError::Sqlx`] if the delete fails.
pub async fn delete_tag(pool: &PgPool, tag_id: i64) -> Result<(), DbError> {
    let affected = sqlx::query("DELETE FROM tags WHERE id = $1")
        .bind(tag_id)
        .execute(pool)
        .await?
        .rows_affected();
    if affected == 0 {
        return Err(DbError::NotFound);
    }
    Ok(())
}
