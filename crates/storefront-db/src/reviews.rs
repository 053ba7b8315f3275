//! Database operations for the `reviews` table.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::DbError;

/// A row from the `reviews` table joined with the reviewer's username.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ReviewRow {
    pub id: i64,
    pub product_id: i64,
    pub reviewer_id: i64,
    pub reviewer_username: String,
    pub comment: String,
    pub rating: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Returns all reviews of a product, newest first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_reviews_for_product(
    pool: &PgPool,
    product_id: i64,
) -> Result<Vec<ReviewRow>, DbError> {
    let rows = sqlx::query_as::<_, ReviewRow>(
        "SELECT r.id, r.product_id, r.reviewer_id, u.username AS reviewer_username, \
                r.comment, r.rating, r.created_at, r.updated_at \
         FROM reviews r \
         JOIN users u ON u.id = r.reviewer_id \
         WHERE r.product_id = $1 \
         ORDER BY r.created_at DESC, r.id DESC",
    )
    .bind(product_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Returns a review by id, or `None` if not found.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_review(pool: &PgPool, review_id: i64) -> Result<Option<ReviewRow>, DbError> {
    let row = sqlx::query_as::<_, ReviewRow>(
        "SELECT r.id, r.product_id, r.reviewer_id, u.username AS reviewer_username, \
                r.comment, r.rating, r.created_at, r.updated_at \
         FROM reviews r \
         JOIN users u ON u.id = r.reviewer_id \
         WHERE r.id = $1",
    )
    .bind(review_id)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

/// Creates a review and returns the full inserted row.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails (including FK and rating
/// CHECK violations).
pub async fn create_review(
    pool: &PgPool,
    product_id: i64,
    reviewer_id: i64,
    comment: &str,
    rating: i32,
) -> Result<ReviewRow, DbError> {
    let row = sqlx::query_as::<_, ReviewRow>(
        "WITH inserted AS ( \
             INSERT INTO reviews (product_id, reviewer_id, comment, rating) \
             VALUES ($1, $2, $3, $4) \
             RETURNING id, product_id, reviewer_id, comment, rating, created_at, updated_at \
         ) \
         SELECT i.id, i.product_id, i.reviewer_id, u.username AS reviewer_username, \
                i.comment, i.rating, i.created_at, i.updated_at \
         FROM inserted i \
         JOIN users u ON u.id = i.reviewer_id",
    )
    .bind(product_id)
    .bind(reviewer_id)
    .bind(comment)
    .bind(rating)
    .fetch_one(pool)
    .await?;
    Ok(row)
}

/// Updates a review's comment and rating; only the original reviewer may do
/// so, enforced here by scoping the UPDATE to `reviewer_id`.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no matching review exists for that
/// reviewer, or [`DbError::Sqlx`] if the query fails.
pub async fn update_review(
    pool: &PgPool,
    review_id: i64,
    reviewer_id: i64,
    comment: &str,
    rating: i32,
) -> Result<ReviewRow, DbError> {
    let row = sqlx::query_as::<_, ReviewRow>(
        "WITH updated AS ( \
             UPDATE reviews \
             SET comment = $3, rating = $4, updated_at = NOW() \
             WHERE id = $1 AND reviewer_id = $2 \
             RETURNING id, product_id, reviewer_id, comment, rating, created_at, updated_at \
         ) \
         SELECT up.id, up.product_id, up.reviewer_id, u.username AS reviewer_username, \
                up.comment, up.rating, up.created_at, up.updated_at \
         FROM updated up \
         JOIN users u ON u.id = up.reviewer_id",
    )
    .bind(review_id)
    .bind(reviewer_id)
    .bind(comment)
    .bind(rating)
    .fetch_optional(pool)
    .await?;
    row.ok_or(DbError::NotFound)
}

/// Deletes a review owned by the given reviewer.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no matching review exists for that
/// reviewer, or [`DbError::Sqlx`] if the delete fails.
pub async fn delete_review(pool: &PgPool, review_id: i64, reviewer_id: i64) -> Result<(), DbError> {
    let affected = sqlx::query("DELETE FROM reviews WHERE id = $1 AND reviewer_id = $2")
        .bind(review_id)
        .bind(reviewer_id)
        .execute(pool)
        .await?
        .rows_affected();
    if affected == 0 {
        return Err(DbError::NotFound);
    }
    Ok(())
}
