//! Database operations for the `orders` and `order_items` tables.
//!
//! Checkout is the one read-modify-write in the system that must be atomic:
//! stock decrements, order creation, and cart clearing either all commit or
//! none do. Concurrent checkouts against the same variant serialize on the
//! `FOR UPDATE` row locks taken in variant-id order.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use storefront_core::OrderStatus;

use crate::DbError;

/// A row from the `orders` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct OrderRow {
    pub id: i64,
    pub user_id: i64,
    pub status: String,
    pub total_amount: Decimal,
    pub payment_status: String,
    pub payment_mode: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A row from the `order_items` table. `price` is the variant price frozen
/// at checkout.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct OrderItemRow {
    pub id: i64,
    pub order_id: i64,
    pub variant_id: i64,
    pub quantity: i32,
    pub price: Decimal,
}

#[derive(Debug, sqlx::FromRow)]
struct CheckoutLine {
    variant_id: i64,
    quantity: i32,
    price: Decimal,
    stock: i32,
}

/// Creates an order from the user's cart in one transaction.
///
/// Locks the cart's variant rows (`FOR UPDATE`, ordered by variant id so
/// concurrent checkouts acquire locks in the same order), verifies stock for
/// every line, inserts the order in `pending` status with the computed total,
/// copies quantity and the variant's current price into `order_items`,
/// decrements stock, and clears the cart. Any failure rolls the whole
/// transaction back; no partial order can exist.
///
/// # Errors
///
/// - [`DbError::EmptyCart`] if the cart has no items.
/// - [`DbError::InsufficientStock`] if any line exceeds current stock.
/// - [`DbError::Sqlx`] if any statement fails.
pub async fn checkout(pool: &PgPool, user_id: i64) -> Result<OrderRow, DbError> {
    let mut tx = pool.begin().await?;

    let lines = sqlx::query_as::<_, CheckoutLine>(
        "SELECT ci.variant_id, ci.quantity, v.price, v.stock \
         FROM cart_items ci \
         JOIN carts c ON c.id = ci.cart_id \
         JOIN variants v ON v.id = ci.variant_id \
         WHERE c.user_id = $1 \
         ORDER BY ci.variant_id \
         FOR UPDATE OF v",
    )
    .bind(user_id)
    .fetch_all(&mut *tx)
    .await?;

    if lines.is_empty() {
        return Err(DbError::EmptyCart);
    }

    for line in &lines {
        if line.quantity > line.stock {
            return Err(DbError::InsufficientStock {
                variant_id: line.variant_id,
            });
        }
    }

    let total_amount: Decimal = lines
        .iter()
        .map(|line| line.price * Decimal::from(line.quantity))
        .sum();

    let order = sqlx::query_as::<_, OrderRow>(
        "INSERT INTO orders (user_id, status, total_amount) \
         VALUES ($1, 'pending', $2) \
         RETURNING id, user_id, status, total_amount, payment_status, payment_mode, \
                   created_at, updated_at",
    )
    .bind(user_id)
    .bind(total_amount)
    .fetch_one(&mut *tx)
    .await?;

    for line in &lines {
        sqlx::query(
            "INSERT INTO order_items (order_id, variant_id, quantity, price) \
             VALUES ($1, $2, $3, $4)",
        )
        .bind(order.id)
        .bind(line.variant_id)
        .bind(line.quantity)
        .bind(line.price)
        .execute(&mut *tx)
        .await?;

        // Guarded decrement; the earlier check plus the row lock make this
        // succeed, but a zero row count still rolls everything back.
        let affected = sqlx::query(
            "UPDATE variants SET stock = stock - $2, updated_at = NOW() \
             WHERE id = $1 AND stock >= $2",
        )
        .bind(line.variant_id)
        .bind(line.quantity)
        .execute(&mut *tx)
        .await?
        .rows_affected();
        if affected == 0 {
            return Err(DbError::InsufficientStock {
                variant_id: line.variant_id,
            });
        }
    }

    sqlx::query(
        "DELETE FROM cart_items ci \
         USING carts c \
         WHERE ci.cart_id = c.id AND c.user_id = $1",
    )
    .bind(user_id)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(order)
}

/// Returns a user's orders, newest first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_orders_for_user(pool: &PgPool, user_id: i64) -> Result<Vec<OrderRow>, DbError> {
    let rows = sqlx::query_as::<_, OrderRow>(
        "SELECT id, user_id, status, total_amount, payment_status, payment_mode, \
                created_at, updated_at \
         FROM orders \
         WHERE user_id = $1 \
         ORDER BY created_at DESC, id DESC",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Returns one order scoped to its owner, or `None` if not found.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_order_for_user(
    pool: &PgPool,
    user_id: i64,
    order_id: i64,
) -> Result<Option<OrderRow>, DbError> {
    let row = sqlx::query_as::<_, OrderRow>(
        "SELECT id, user_id, status, total_amount, payment_status, payment_mode, \
                created_at, updated_at \
         FROM orders \
         WHERE id = $1 AND user_id = $2",
    )
    .bind(order_id)
    .bind(user_id)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

/// Returns an order's items ordered by id.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_order_items(pool: &PgPool, order_id: i64) -> Result<Vec<OrderItemRow>, DbError> {
    let rows = sqlx::query_as::<_, OrderItemRow>(
        "SELECT id, order_id, variant_id, quantity, price \
         FROM order_items \
         WHERE order_id = $1 \
         ORDER BY id",
    )
    .bind(order_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Moves an order to a new status if the state machine permits it.
///
/// Locks the order row so the current status cannot change between the
/// transition check and the write.
///
/// # Errors
///
/// - [`DbError::NotFound`] if the order does not exist for that user.
/// - [`DbError::InvalidTransition`] for backward or post-terminal moves.
/// - [`DbError::Sqlx`] if any statement fails.
pub async fn update_order_status(
    pool: &PgPool,
    user_id: i64,
    order_id: i64,
    new_status: OrderStatus,
) -> Result<OrderRow, DbError> {
    let mut tx = pool.begin().await?;

    let current: Option<String> = sqlx::query_scalar(
        "SELECT status FROM orders WHERE id = $1 AND user_id = $2 FOR UPDATE",
    )
    .bind(order_id)
    .bind(user_id)
    .fetch_optional(&mut *tx)
    .await?;
    let Some(current) = current else {
        return Err(DbError::NotFound);
    };

    // The CHECK constraint keeps stored statuses inside the known set, so
    // parsing only fails on schema drift; treat that as an invalid transition.
    let from: OrderStatus = current
        .parse()
        .map_err(|_| DbError::InvalidTransition {
            from: current.clone(),
            to: new_status.to_string(),
        })?;

    if !from.can_transition_to(new_status) {
        return Err(DbError::InvalidTransition {
            from: from.to_string(),
            to: new_status.to_string(),
        });
    }

    let row = sqlx::query_as::<_, OrderRow>(
        "UPDATE orders \
         SET status = $2, updated_at = NOW() \
         WHERE id = $1 \
         RETURNING id, user_id, status, total_amount, payment_status, payment_mode, \
                   created_at, updated_at",
    )
    .bind(order_id)
    .bind(new_status.as_str())
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(row)
}
