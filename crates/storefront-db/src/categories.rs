//! Database operations for the `categories` table.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::DbError;

/// A row from the `categories` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CategoryRow {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Returns all categories ordered by name.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_categories(pool: &PgPool) -> Result<Vec<CategoryRow>, DbError> {
    let rows = sqlx::query_as::<_, CategoryRow>(
        "SELECT id, name, description, created_at, updated_at \
         FROM categories \
         ORDER BY name",
    )
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Returns a single category by id, or `None` if not found.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_category(pool: &PgPool, category_id: i64) -> Result<Option<CategoryRow>, DbError> {
    let row = sqlx::query_as::<_, CategoryRow>(
        "SELECT id, name, description, created_at, updated_at \
         FROM categories \
         WHERE id = $1",
    )
    .bind(category_id)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

/// Creates a new category and returns the full inserted row.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
pub async fn create_category(
    pool: &PgPool,
    name: &str,
    description: &str,
) -> Result<CategoryRow, DbError> {
    let row = sqlx::query_as::<_, CategoryRow>(
        "INSERT INTO categories (name, description) \
         VALUES ($1, $2) \
         RETURNING id, name, description, created_at, updated_at",
    )
    .bind(name)
    .bind(description)
    .fetch_one(pool)
    .await?;
    Ok(row)
}

/// Replaces a category's fields and returns the updated row.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no category has the given id, or
/// [`DbError::Sqlx`] if the query fails.
pub async fn update_category(
    pool: &PgPool,
    category_id: i64,
    name: &str,
    description: &str,
) -> Result<CategoryRow, DbError> {
    let row = sqlx::query_as::<_, CategoryRow>(
        "UPDATE categories \
         SET name = $2, description = $3, updated_at = NOW() \
         WHERE id = $1 \
         RETURNING id, name, description, created_at, updated_at",
    )
    .bind(category_id)
    .bind(name)
    .bind(description)
    .fetch_optional(pool)
    .await?;
    row.ok_or(DbError::NotFound)
}

/// Deletes a category; dependents cascade per the schema.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no category has the given id, or
/// [`DbError::Sqlx`] if the delete fails.
pub async fn delete_category(pool: &PgPool, category_id: i64) -> Result<(), DbError> {
    let affected = sqlx::query("DELETE FROM categories WHERE id = $1")
        .bind(category_id)
        .execute(pool)
        .await?
        .rows_affected();
    if affected == 0 {
        return Err(DbError::NotFound);
    }
    Ok(())
}
