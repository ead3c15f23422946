//! Integration tests for order ingestion.

mod common;

use sqlx::PgPool;

use presshub_core::order_events::{EventLineItem, OrderCreatedEvent};
use presshub_core::status::ProductionStatus;
use presshub_db::repositories::{BatchRepo, OrderItemRepo, OrderRepo};

use common::*;

fn event(order_number: i64, lines: Vec<EventLineItem>) -> OrderCreatedEvent {
    OrderCreatedEvent {
        external_id: format!("gid://order/{order_number}"),
        order_number,
        customer_name: Some("Jane Doe".into()),
        customer_email: Some("jane@example.com".into()),
        customer_phone: Some("+201000000000".into()),
        address1: Some("1 Main St".into()),
        address2: None,
        province: Some("Cairo".into()),
        total_price: Some(42.0),
        prepaid: false,
        line_items: lines,
    }
}

fn line(product: &str, quantity: i32) -> EventLineItem {
    EventLineItem {
        external_id: Some(format!("gid://line/{product}/{quantity}")),
        product_external_id: format!("gid://product/{product}"),
        variant_external_id: None,
        quantity,
        price: Some(21.0),
    }
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn ingestion_creates_order_and_allocates(pool: PgPool) {
    let store = seed_store(&pool).await;
    seed_rule(&pool, &store, "Mugs", None, true, false).await;
    seed_product(&pool, &store, "Mugs").await;

    let eng = engine(&pool);
    let order = eng
        .ingest_order(store.id, &event(7001, vec![line("Mugs", 2), line("Mugs", 3)]))
        .await
        .unwrap()
        .expect("order should be created");

    let mut conn = pool.acquire().await.unwrap();
    // Duplicate lines for the same product/variant merged into one item.
    let items = OrderItemRepo::list_for_order(&mut conn, order.id).await.unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].quantity, 5);
    assert_eq!(items[0].status(), ProductionStatus::WaitingBatch);

    // Allocation ran: one batch with capacity 5.
    let batches = BatchRepo::list_for_order(&mut conn, order.id).await.unwrap();
    assert_eq!(batches.len(), 1);
    assert_eq!(batches[0].capacity, 5);

    let order_row = OrderRepo::find_by_id(&mut conn, order.id).await.unwrap().unwrap();
    assert_eq!(order_row.status(), ProductionStatus::WaitingBatch);
}

/// At-least-once delivery: a second delivery of the same order event is
/// a no-op.
#[sqlx::test(migrations = "../../db/migrations")]
async fn duplicate_delivery_is_skipped(pool: PgPool) {
    let store = seed_store(&pool).await;
    seed_rule(&pool, &store, "Mugs", None, true, false).await;
    seed_product(&pool, &store, "Mugs").await;

    let eng = engine(&pool);
    let payload = event(7002, vec![line("Mugs", 2)]);

    let first = eng.ingest_order(store.id, &payload).await.unwrap();
    assert!(first.is_some());

    let second = eng.ingest_order(store.id, &payload).await.unwrap();
    assert!(second.is_none());

    let mut conn = pool.acquire().await.unwrap();
    let order = first.unwrap();
    let batches = BatchRepo::list_for_order(&mut conn, order.id).await.unwrap();
    assert_eq!(batches.len(), 1);
    assert_eq!(batches[0].capacity, 2);
}

/// Malformed events are rejected before any mutation.
#[sqlx::test(migrations = "../../db/migrations")]
async fn zero_quantity_line_is_rejected(pool: PgPool) {
    let store = seed_store(&pool).await;
    seed_product(&pool, &store, "Mugs").await;

    let eng = engine(&pool);
    let err = eng
        .ingest_order(store.id, &event(7004, vec![line("Mugs", 0)]))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        presshub_engine::EngineError::Core(presshub_core::error::CoreError::Validation(_))
    ));

    let mut conn = pool.acquire().await.unwrap();
    let exists: (bool,) =
        sqlx::query_as("SELECT EXISTS(SELECT 1 FROM orders WHERE order_number = 7004)")
            .fetch_one(&mut *conn)
            .await
            .unwrap();
    assert!(!exists.0);
}

/// Unknown products are skipped with a warning; known lines still land.
#[sqlx::test(migrations = "../../db/migrations")]
async fn unknown_product_lines_are_skipped(pool: PgPool) {
    let store = seed_store(&pool).await;
    seed_rule(&pool, &store, "Mugs", None, true, false).await;
    seed_product(&pool, &store, "Mugs").await;

    let eng = engine(&pool);
    let order = eng
        .ingest_order(
            store.id,
            &event(7003, vec![line("Mugs", 1), line("Ghost", 9)]),
        )
        .await
        .unwrap()
        .unwrap();

    let mut conn = pool.acquire().await.unwrap();
    let items = OrderItemRepo::list_for_order(&mut conn, order.id).await.unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].quantity, 1);
}
