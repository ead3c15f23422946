//! Shared fixtures for engine integration tests.
#![allow(dead_code)]

use sqlx::PgPool;

use presshub_db::models::order::{CreateOrder, CreateOrderItem, Order, OrderItem};
use presshub_db::models::product::{Product, ProductVariant};
use presshub_db::models::rule::ClassificationRule;
use presshub_db::models::store::Store;
use presshub_db::repositories::{
    ClassificationRuleRepo, OrderItemRepo, OrderRepo, ProductRepo, ProductVariantRepo, StoreRepo,
};
use presshub_engine::{Engine, ScanCodeConfig};

/// Engine over the test pool with a fixed public host.
pub fn engine(pool: &PgPool) -> Engine {
    Engine::new(pool.clone(), ScanCodeConfig::new("http://testhost"))
}

pub async fn seed_store(pool: &PgPool) -> Store {
    let mut conn = pool.acquire().await.unwrap();
    StoreRepo::create(&mut conn, "Test Store", "test-store.example.com")
        .await
        .unwrap()
}

pub async fn seed_rule(
    pool: &PgPool,
    store: &Store,
    name: &str,
    variant_title: Option<&str>,
    is_pod: bool,
    requires_stock: bool,
) -> ClassificationRule {
    let mut conn = pool.acquire().await.unwrap();
    ClassificationRuleRepo::create(&mut conn, store.id, name, variant_title, is_pod, requires_stock)
        .await
        .unwrap()
}

pub async fn seed_product(pool: &PgPool, store: &Store, product_type: &str) -> Product {
    let mut conn = pool.acquire().await.unwrap();
    ProductRepo::create(
        &mut conn,
        store.id,
        &format!("gid://product/{product_type}"),
        product_type,
        Some(product_type),
        true,
    )
    .await
    .unwrap()
}

pub async fn seed_variant(
    pool: &PgPool,
    product: &Product,
    sku: Option<&str>,
    title: Option<&str>,
) -> ProductVariant {
    let mut conn = pool.acquire().await.unwrap();
    ProductVariantRepo::create(
        &mut conn,
        product.id,
        &format!("gid://variant/{}", sku.unwrap_or("default")),
        sku,
        title,
        Some(10.0),
    )
    .await
    .unwrap()
}

pub async fn seed_order(pool: &PgPool, store: &Store, order_number: i64) -> Order {
    let mut conn = pool.acquire().await.unwrap();
    OrderRepo::create(
        &mut conn,
        &CreateOrder {
            store_id: store.id,
            external_id: format!("gid://order/{order_number}"),
            order_number,
            customer_name: Some("Test Customer".into()),
            customer_email: None,
            customer_phone: Some("+201000000000".into()),
            address1: Some("1 Main St".into()),
            address2: None,
            province: Some("Cairo".into()),
            total_price: Some(100.0),
            prepaid: false,
        },
    )
    .await
    .unwrap()
}

pub async fn seed_order_item(
    pool: &PgPool,
    order: &Order,
    product: &Product,
    variant: Option<&ProductVariant>,
    quantity: i32,
) -> OrderItem {
    let mut conn = pool.acquire().await.unwrap();
    OrderItemRepo::create(
        &mut conn,
        &CreateOrderItem {
            order_id: order.id,
            product_id: product.id,
            variant_id: variant.map(|v| v.id),
            external_line_id: Some(format!("gid://line/{}", order.id)),
            quantity,
            price: Some(10.0),
        },
    )
    .await
    .unwrap()
}
