//! Offline unit tests for storefront-db pool configuration and row types.
//! These tests do not require a live database connection.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;

use chrono::Utc;
use rust_decimal::Decimal;
use storefront_core::{AppConfig, Environment};
use storefront_db::{CartItemRow, OrderRow, PoolConfig, ProductRow, VariantRow};

#[test]
fn pool_config_from_app_config_uses_core_values() {
    let app_config = AppConfig {
        database_url: "postgres://example".to_string(),
        env: Environment::Test,
        bind_addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 3000),
        log_level: "info".to_string(),
        jwt_secret: "0123456789abcdef0123456789abcdef".to_string(),
        access_token_ttl_minutes: 60,
        refresh_token_ttl_minutes: 10080,
        seed_path: PathBuf::from("./config/catalog.yaml"),
        db_max_connections: 42,
        db_min_connections: 7,
        db_acquire_timeout_secs: 9,
    };

    let pool_config = PoolConfig::from_app_config(&app_config);
    assert_eq!(pool_config.max_connections, 42);
    assert_eq!(pool_config.min_connections, 7);
    assert_eq!(pool_config.acquire_timeout_secs, 9);
}

/// Compile-time smoke test: confirm that [`ProductRow`] has all expected
/// fields with the correct types. No database required.
#[test]
fn product_row_has_expected_fields() {
    let row = ProductRow {
        id: 42_i64,
        category_id: Some(1),
        brand_id: None,
        base_name: "Leatherwood Table".to_string(),
        description: "Leatherwood table with built-in storage".to_string(),
        base_price: Decimal::new(15999, 2),
        metadata: serde_json::json!({"finish": "matte"}),
        created_at: Utc::now(),
        updated_at: Utc::now(),
    };

    assert_eq!(row.id, 42);
    assert_eq!(row.category_id, Some(1));
    assert!(row.brand_id.is_none());
    assert_eq!(row.base_price, Decimal::new(15999, 2));
    assert_eq!(row.metadata["finish"], "matte");
}

#[test]
fn variant_row_has_expected_fields() {
    let row = VariantRow {
        id: 7_i64,
        product_id: 42_i64,
        name: "Black".to_string(),
        price: Decimal::new(13999, 2),
        color: "Black".to_string(),
        stock: 10,
        size: "M".to_string(),
        created_at: Utc::now(),
        updated_at: Utc::now(),
    };

    assert_eq!(row.product_id, 42);
    assert_eq!(row.stock, 10);
    assert_eq!(row.price, Decimal::new(13999, 2));
}

#[test]
fn cart_item_row_carries_variant_snapshot_fields() {
    let row = CartItemRow {
        id: 1,
        cart_id: 2,
        variant_id: 7,
        variant_name: "Black".to_string(),
        variant_price: Decimal::new(13999, 2),
        variant_stock: 10,
        quantity: 3,
    };

    assert_eq!(row.quantity, 3);
    assert_eq!(row.variant_stock, 10);
}

#[test]
fn order_row_has_expected_fields() {
    let row = OrderRow {
        id: 9,
        user_id: 4,
        status: "pending".to_string(),
        total_amount: Decimal::new(8998, 2),
        payment_status: "unpaid".to_string(),
        payment_mode: None,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    };

    assert_eq!(row.status, "pending");
    assert_eq!(row.total_amount, Decimal::new(8998, 2));
    assert!(row.payment_mode.is_none());
}
