//! Database operations for the `carts` and `cart_items` tables.
//!
//! A cart is created lazily on first add and lives for the user's lifetime.
//! Quantity mutations take a row lock on the variant so the stock check and
//! the upsert are one atomic unit.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use crate::DbError;

/// A row from the `carts` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CartRow {
    pub id: i64,
    pub user_id: i64,
    pub created_at: DateTime<Utc>,
}

/// A cart item joined with its variant's name, current price, and stock.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CartItemRow {
    pub id: i64,
    pub cart_id: i64,
    pub variant_id: i64,
    pub variant_name: String,
    pub variant_price: Decimal,
    pub variant_stock: i32,
    pub quantity: i32,
}

/// Returns the user's cart, creating it if absent.
///
/// The upsert's no-op `DO UPDATE` makes `RETURNING` yield the existing row
/// on conflict, so create-and-fetch is a single statement.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_or_create_cart(pool: &PgPool, user_id: i64) -> Result<CartRow, DbError> {
    let row = sqlx::query_as::<_, CartRow>(
        "INSERT INTO carts (user_id) \
         VALUES ($1) \
         ON CONFLICT (user_id) DO UPDATE SET user_id = EXCLUDED.user_id \
         RETURNING id, user_id, created_at",
    )
    .bind(user_id)
    .fetch_one(pool)
    .await?;
    Ok(row)
}

/// Returns the items in the user's cart joined with variant data, ordered by
/// variant id. An absent cart reads as empty.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_cart_items(pool: &PgPool, user_id: i64) -> Result<Vec<CartItemRow>, DbError> {
    let rows = sqlx::query_as::<_, CartItemRow>(
        "SELECT ci.id, ci.cart_id, ci.variant_id, v.name AS variant_name, \
                v.price AS variant_price, v.stock AS variant_stock, ci.quantity \
         FROM cart_items ci \
         JOIN carts c ON c.id = ci.cart_id \
         JOIN variants v ON v.id = ci.variant_id \
         WHERE c.user_id = $1 \
         ORDER BY ci.variant_id",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Returns one cart item by id, scoped to the owning user.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_cart_item(
    pool: &PgPool,
    user_id: i64,
    item_id: i64,
) -> Result<Option<CartItemRow>, DbError> {
    let row = sqlx::query_as::<_, CartItemRow>(
        "SELECT ci.id, ci.cart_id, ci.variant_id, v.name AS variant_name, \
                v.price AS variant_price, v.stock AS variant_stock, ci.quantity \
         FROM cart_items ci \
         JOIN carts c ON c.id = ci.cart_id \
         JOIN variants v ON v.id = ci.variant_id \
         WHERE c.user_id = $1 AND ci.id = $2",
    )
    .bind(user_id)
    .bind(item_id)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

/// Adds a variant to the user's cart, accumulating quantity on repeat adds.
///
/// Creates the cart if absent. Locks the variant row, then verifies that
/// existing + requested quantity does not exceed current stock before
/// upserting, all within one transaction.
///
/// # Errors
///
/// - [`DbError::NotFound`] if the variant does not exist.
/// - [`DbError::InsufficientStock`] if the accumulated quantity would exceed
///   the variant's stock.
/// - [`DbError::Sqlx`] if any statement fails.
pub async fn add_to_cart(
    pool: &PgPool,
    user_id: i64,
    variant_id: i64,
    quantity: i32,
) -> Result<CartItemRow, DbError> {
    let mut tx = pool.begin().await?;

    let cart_id: i64 = sqlx::query_scalar(
        "INSERT INTO carts (user_id) \
         VALUES ($1) \
         ON CONFLICT (user_id) DO UPDATE SET user_id = EXCLUDED.user_id \
         RETURNING id",
    )
    .bind(user_id)
    .fetch_one(&mut *tx)
    .await?;

    let stock: Option<i32> = sqlx::query_scalar("SELECT stock FROM variants WHERE id = $1 FOR UPDATE")
        .bind(variant_id)
        .fetch_optional(&mut *tx)
        .await?;
    let Some(stock) = stock else {
        return Err(DbError::NotFound);
    };

    let existing: i32 = sqlx::query_scalar(
        "SELECT quantity FROM cart_items WHERE cart_id = $1 AND variant_id = $2",
    )
    .bind(cart_id)
    .bind(variant_id)
    .fetch_optional(&mut *tx)
    .await?
    .unwrap_or(0);

    if existing + quantity > stock {
        return Err(DbError::InsufficientStock { variant_id });
    }

    let item_id: i64 = sqlx::query_scalar(
        "INSERT INTO cart_items (cart_id, variant_id, quantity) \
         VALUES ($1, $2, $3) \
         ON CONFLICT (cart_id, variant_id) DO UPDATE SET \
             quantity   = cart_items.quantity + EXCLUDED.quantity, \
             updated_at = NOW() \
         RETURNING id",
    )
    .bind(cart_id)
    .bind(variant_id)
    .bind(quantity)
    .fetch_one(&mut *tx)
    .await?;

    let row = sqlx::query_as::<_, CartItemRow>(
        "SELECT ci.id, ci.cart_id, ci.variant_id, v.name AS variant_name, \
                v.price AS variant_price, v.stock AS variant_stock, ci.quantity \
         FROM cart_items ci \
         JOIN variants v ON v.id = ci.variant_id \
         WHERE ci.id = $1",
    )
    .bind(item_id)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(row)
}

/// Sets a cart item's quantity outright (not accumulating), with the same
/// stock check as [`add_to_cart`].
///
/// # Errors
///
/// - [`DbError::NotFound`] if the item does not belong to the user's cart.
/// - [`DbError::InsufficientStock`] if the new quantity exceeds stock.
/// - [`DbError::Sqlx`] if any statement fails.
pub async fn update_cart_item_quantity(
    pool: &PgPool,
    user_id: i64,
    item_id: i64,
    quantity: i32,
) -> Result<CartItemRow, DbError> {
    let mut tx = pool.begin().await?;

    let variant_id: Option<i64> = sqlx::query_scalar(
        "SELECT ci.variant_id \
         FROM cart_items ci \
         JOIN carts c ON c.id = ci.cart_id \
         WHERE c.user_id = $1 AND ci.id = $2",
    )
    .bind(user_id)
    .bind(item_id)
    .fetch_optional(&mut *tx)
    .await?;
    let Some(variant_id) = variant_id else {
        return Err(DbError::NotFound);
    };

    let stock: i32 = sqlx::query_scalar("SELECT stock FROM variants WHERE id = $1 FOR UPDATE")
        .bind(variant_id)
        .fetch_one(&mut *tx)
        .await?;

    if quantity > stock {
        return Err(DbError::InsufficientStock { variant_id });
    }

    sqlx::query("UPDATE cart_items SET quantity = $2, updated_at = NOW() WHERE id = $1")
        .bind(item_id)
        .bind(quantity)
        .execute(&mut *tx)
        .await?;

    let row = sqlx::query_as::<_, CartItemRow>(
        "SELECT ci.id, ci.cart_id, ci.variant_id, v.name AS variant_name, \
                v.price AS variant_price, v.stock AS variant_stock, ci.quantity \
         FROM cart_items ci \
         JOIN variants v ON v.id = ci.variant_id \
         WHERE ci.id = $1",
    )
    .bind(item_id)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(row)
}

/// Removes one item from the user's cart.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if the item does not belong to the user's
/// cart, or [`DbError::Sqlx`] if the delete fails.
pub async fn remove_cart_item(pool: &PgPool, user_id: i64, item_id: i64) -> Result<(), DbError> {
    let affected = sqlx::query(
        "DELETE FROM cart_items ci \
         USING carts c \
         WHERE ci.cart_id = c.id AND c.user_id = $1 AND ci.id = $2",
    )
    .bind(user_id)
    .bind(item_id)
    .execute(pool)
    .await?
    .rows_affected();
    if affected == 0 {
        return Err(DbError::NotFound);
    }
    Ok(())
}

/// Removes every item from the user's cart. The cart row itself persists.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the delete fails.
pub async fn clear_cart(pool: &PgPool, user_id: i64) -> Result<(), DbError> {
    sqlx::query(
        "DELETE FROM cart_items ci \
         USING carts c \
         WHERE ci.cart_id = c.id AND c.user_id = $1",
    )
    .bind(user_id)
    .execute(pool)
    .await?;
    Ok(())
}
