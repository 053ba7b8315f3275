//! Demo-catalog seeding from a [`SeedCatalog`] fixture.

use std::collections::HashMap;

use sqlx::PgPool;
use storefront_core::catalog::SeedCatalog;

use crate::DbError;

/// Returns `true` when no products exist yet.
///
/// Startup seeding checks this first so a restart against an already-seeded
/// database does not duplicate the fixture.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn catalog_is_empty(pool: &PgPool) -> Result<bool, DbError> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
        .fetch_one(pool)
        .await?;
    Ok(count == 0)
}

/// Insert the seed catalog into the database.
///
/// Returns the number of products created. Everything runs inside a single
/// transaction; if any insert fails the entire batch is rolled back. Names
/// are matched within the fixture only — the routine assumes a fresh
/// database and does not try to reconcile with existing rows.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if any database operation fails.
pub async fn seed_catalog(pool: &PgPool, catalog: &SeedCatalog) -> Result<usize, DbError> {
    let mut tx = pool.begin().await?;

    let mut category_ids: HashMap<&str, i64> = HashMap::new();
    for category in &catalog.categories {
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO categories (name, description) VALUES ($1, $2) RETURNING id",
        )
        .bind(&category.name)
        .bind(&category.description)
        .fetch_one(&mut *tx)
        .await?;
        category_ids.insert(category.name.as_str(), id);
    }

    let mut brand_ids: HashMap<&str, i64> = HashMap::new();
    for brand in &catalog.brands {
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO brands (name, description) VALUES ($1, $2) RETURNING id",
        )
        .bind(&brand.name)
        .bind(&brand.description)
        .fetch_one(&mut *tx)
        .await?;
        brand_ids.insert(brand.name.as_str(), id);
    }

    let mut count = 0usize;
    for product in &catalog.products {
        let category_id = product
            .category
            .as_deref()
            .and_then(|name| category_ids.get(name).copied());
        let brand_id = product
            .brand
            .as_deref()
            .and_then(|name| brand_ids.get(name).copied());

        let product_id: i64 = sqlx::query_scalar(
            "INSERT INTO products (category_id, brand_id, base_name, description, base_price) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING id",
        )
        .bind(category_id)
        .bind(brand_id)
        .bind(&product.base_name)
        .bind(&product.description)
        .bind(product.base_price)
        .fetch_one(&mut *tx)
        .await?;

        for variant in &product.variants {
            let variant_id: i64 = sqlx::query_scalar(
                "INSERT INTO variants (product_id, name, price, color, stock, size) \
                 VALUES ($1, $2, $3, $4, $5, $6) \
                 RETURNING id",
            )
            .bind(product_id)
            .bind(&variant.name)
            .bind(variant.price)
            .bind(&variant.color)
            .bind(variant.stock)
            .bind(&variant.size)
            .fetch_one(&mut *tx)
            .await?;

            for url in &variant.images {
                let image_id: i64 =
                    sqlx::query_scalar("INSERT INTO images (url) VALUES ($1) RETURNING id")
                        .bind(url)
                        .fetch_one(&mut *tx)
                        .await?;
                sqlx::query("INSERT INTO variant_images (variant_id, image_id) VALUES ($1, $2)")
                    .bind(variant_id)
                    .bind(image_id)
                    .execute(&mut *tx)
                    .await?;
            }
        }

        for spec in &product.specifications {
            sqlx::query("INSERT INTO specifications (product_id, name, value) VALUES ($1, $2, $3)")
                .bind(product_id)
                .bind(&spec.name)
                .bind(&spec.value)
                .execute(&mut *tx)
                .await?;
        }

        for compat in &product.compatibilities {
            sqlx::query(
                "INSERT INTO compatibilities (product_id, name, product_type) VALUES ($1, $2, $3)",
            )
            .bind(product_id)
            .bind(&compat.name)
            .bind(&compat.product_type)
            .execute(&mut *tx)
            .await?;
        }

        if let Some(ref delivery) = product.delivery {
            sqlx::query(
                "INSERT INTO delivery_time_statuses \
                     (product_id, shipping_cost, estimated_delivery_time, additional_info) \
                 VALUES ($1, $2, $3, $4)",
            )
            .bind(product_id)
            .bind(delivery.shipping_cost)
            .bind(&delivery.estimated_delivery_time)
            .bind(&delivery.additional_info)
            .execute(&mut *tx)
            .await?;
        }

        for faq in &product.faqs {
            sqlx::query("INSERT INTO faqs (product_id, question, answer) VALUES ($1, $2, $3)")
                .bind(product_id)
                .bind(&faq.question)
                .bind(&faq.answer)
                .execute(&mut *tx)
                .await?;
        }

        for entry in &product.carousel {
            sqlx::query(
                "INSERT INTO carousels (product_id, image, title, description, sort_order) \
                 VALUES ($1, $2, $3, $4, $5)",
            )
            .bind(product_id)
            .bind(&entry.image)
            .bind(&entry.title)
            .bind(&entry.description)
            .bind(entry.sort_order)
            .execute(&mut *tx)
            .await?;
        }

        count += 1;
    }

    tx.commit().await?;
    Ok(count)
}
