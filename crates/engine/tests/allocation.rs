//! Integration tests for the batch capacity allocator.
//!
//! Exercises the allocator against a real database: overflow batching,
//! idempotency, deterministic naming, the capacity invariant, and
//! all-or-nothing stock handling.

mod common;

use sqlx::PgPool;

use presshub_core::status::ProductionStatus;
use presshub_db::repositories::{BatchItemRepo, BatchRepo, OrderRepo, StockRepo, UnitRepo};
use presshub_engine::EngineError;

use common::*;

/// Property: an item of quantity 15 against cap-10 batches yields one
/// full BATCHED batch and one WAITING_BATCH batch of 5.
#[sqlx::test(migrations = "../../db/migrations")]
async fn overflow_batching_splits_across_two_batches(pool: PgPool) {
    let store = seed_store(&pool).await;
    seed_rule(&pool, &store, "Mugs", None, true, false).await;
    let product = seed_product(&pool, &store, "Mugs").await;
    let order = seed_order(&pool, &store, 1001).await;
    let item = seed_order_item(&pool, &order, &product, None, 15).await;

    let assignments = engine(&pool).allocate_order(order.id).await.unwrap();
    assert_eq!(assignments.len(), 2);
    assert_eq!(assignments[0].quantity, 10);
    assert_eq!(assignments[1].quantity, 5);

    let mut conn = pool.acquire().await.unwrap();
    let batches = BatchRepo::list_for_order(&mut conn, order.id).await.unwrap();
    assert_eq!(batches.len(), 2);

    let full = batches.iter().find(|b| b.capacity == 10).unwrap();
    let partial = batches.iter().find(|b| b.capacity == 5).unwrap();
    assert_eq!(full.status(), ProductionStatus::Batched);
    assert_eq!(full.name, "Mugs");
    assert_eq!(partial.status(), ProductionStatus::WaitingBatch);
    assert_eq!(partial.name, "Mugs - Batch #2");

    // Capacity invariant: capacity == sum of batch item quantities, and
    // one unit row per unit of quantity.
    for batch in &batches {
        let items = BatchItemRepo::list_for_batch(&mut conn, batch.id).await.unwrap();
        let total: i32 = items.iter().map(|i| i.quantity).sum();
        assert_eq!(batch.capacity, total);
        assert!(batch.capacity <= batch.max_capacity);
        for bi in items {
            let units = UnitRepo::statuses_for_batch_item(&mut conn, bi.id).await.unwrap();
            assert_eq!(units.len() as i32, bi.quantity);
        }
    }

    // The full batch got a scan code on entering BATCHED.
    assert!(full.qr_token.is_some());
    assert!(partial.qr_token.is_none());

    // The order is as unfinished as its least-finished units.
    let order = OrderRepo::find_by_id(&mut conn, order.id).await.unwrap().unwrap();
    assert_eq!(order.status(), ProductionStatus::WaitingBatch);

    // The split item reads one status across both batches.
    let bi = BatchItemRepo::list_for_order_item(&mut conn, item.id).await.unwrap();
    assert_eq!(bi.len(), 2);
}

/// Property: allocating the same order twice produces no duplicate
/// assignments (at-least-once webhook delivery).
#[sqlx::test(migrations = "../../db/migrations")]
async fn allocation_is_idempotent(pool: PgPool) {
    let store = seed_store(&pool).await;
    seed_rule(&pool, &store, "Mugs", None, true, false).await;
    let product = seed_product(&pool, &store, "Mugs").await;
    let order = seed_order(&pool, &store, 1002).await;
    let item = seed_order_item(&pool, &order, &product, None, 3).await;

    let eng = engine(&pool);
    let first = eng.allocate_order(order.id).await.unwrap();
    assert_eq!(first.len(), 1);

    let second = eng.allocate_order(order.id).await.unwrap();
    assert!(second.is_empty());

    let mut conn = pool.acquire().await.unwrap();
    let batch_items = BatchItemRepo::list_for_order_item(&mut conn, item.id).await.unwrap();
    assert_eq!(batch_items.len(), 1);
    assert_eq!(batch_items[0].quantity, 3);

    let batch = BatchRepo::find_by_id(&mut conn, batch_items[0].batch_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(batch.capacity, 3);
}

/// Property: sequential batches for one rule are named "Mugs",
/// "Mugs - Batch #2", "Mugs - Batch #3" — the first instance unsuffixed.
#[sqlx::test(migrations = "../../db/migrations")]
async fn batch_naming_sequence_is_deterministic(pool: PgPool) {
    let store = seed_store(&pool).await;
    seed_rule(&pool, &store, "Mugs", None, true, false).await;
    let product = seed_product(&pool, &store, "Mugs").await;
    let eng = engine(&pool);

    let mut names = Vec::new();
    for number in 0..3 {
        let order = seed_order(&pool, &store, 2000 + number).await;
        seed_order_item(&pool, &order, &product, None, 10).await;
        let assignments = eng.allocate_order(order.id).await.unwrap();
        assert_eq!(assignments.len(), 1);
        names.push(assignments[0].batch_name.clone());
    }

    assert_eq!(names, vec!["Mugs", "Mugs - Batch #2", "Mugs - Batch #3"]);
}

/// Rules matching is variant-exact first, generic fallback second.
#[sqlx::test(migrations = "../../db/migrations")]
async fn variant_rule_takes_precedence_over_generic(pool: PgPool) {
    let store = seed_store(&pool).await;
    seed_rule(&pool, &store, "Stickers", None, true, false).await;
    seed_rule(&pool, &store, "Stickers", Some("Large"), true, false).await;
    let product = seed_product(&pool, &store, "Stickers").await;
    let variant = seed_variant(&pool, &product, Some("STK-L"), Some("Large")).await;
    let order = seed_order(&pool, &store, 3001).await;
    seed_order_item(&pool, &order, &product, Some(&variant), 2).await;

    let assignments = engine(&pool).allocate_order(order.id).await.unwrap();
    // The variant rule had no prior batch, so the base name carries the
    // variant title.
    assert_eq!(assignments[0].batch_name, "Stickers - Large");
}

/// A rule that is neither POD nor stock-handling is skipped entirely.
#[sqlx::test(migrations = "../../db/migrations")]
async fn non_batchable_rule_is_skipped(pool: PgPool) {
    let store = seed_store(&pool).await;
    seed_rule(&pool, &store, "Giftcards", None, false, false).await;
    let product = seed_product(&pool, &store, "Giftcards").await;
    let order = seed_order(&pool, &store, 3002).await;
    let item = seed_order_item(&pool, &order, &product, None, 1).await;

    let assignments = engine(&pool).allocate_order(order.id).await.unwrap();
    assert!(assignments.is_empty());

    let mut conn = pool.acquire().await.unwrap();
    assert!(
        !BatchItemRepo::exists_for_order_item(&mut conn, item.id).await.unwrap(),
        "no assignment should exist for a non-batchable rule"
    );
}

/// Stock-handling allocation decrements the per-SKU level alongside
/// batching (hybrid rules batch AND draw stock).
#[sqlx::test(migrations = "../../db/migrations")]
async fn stock_allocation_decrements_level(pool: PgPool) {
    let store = seed_store(&pool).await;
    let rule = seed_rule(&pool, &store, "Totes", None, true, true).await;
    let product = seed_product(&pool, &store, "Totes").await;
    let variant = seed_variant(&pool, &product, Some("TOTE-1"), None).await;
    let order = seed_order(&pool, &store, 4001).await;
    seed_order_item(&pool, &order, &product, Some(&variant), 3).await;

    let mut conn = pool.acquire().await.unwrap();
    let stock = StockRepo::create(&mut conn, "Tote warehouse").await.unwrap();
    StockRepo::link_rule(&mut conn, stock.id, rule.id).await.unwrap();
    StockRepo::upsert_level(&mut conn, stock.id, "TOTE-1", 10).await.unwrap();
    drop(conn);

    let assignments = engine(&pool).allocate_order(order.id).await.unwrap();
    assert_eq!(assignments.len(), 1);

    let mut conn = pool.acquire().await.unwrap();
    let level = StockRepo::find_level_for_rule_sku(&mut conn, rule.id, "TOTE-1")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(level.quantity, 7);

    // Stock-handling assignments land in stock-handling batches.
    let batch = BatchRepo::find_by_id(&mut conn, assignments[0].batch_id)
        .await
        .unwrap()
        .unwrap();
    assert!(batch.handles_stock);
}

/// Property: a stock shortfall partway through a multi-item order rolls
/// back every assignment — no batch items, units, or decrements persist.
#[sqlx::test(migrations = "../../db/migrations")]
async fn stock_rejection_is_atomic(pool: PgPool) {
    let store = seed_store(&pool).await;
    let rule = seed_rule(&pool, &store, "Totes", None, true, true).await;
    let product = seed_product(&pool, &store, "Totes").await;
    let variant = seed_variant(&pool, &product, Some("TOTE-1"), None).await;
    let order = seed_order(&pool, &store, 4002).await;
    let first = seed_order_item(&pool, &order, &product, Some(&variant), 3).await;
    let second = seed_order_item(&pool, &order, &product, Some(&variant), 4).await;

    let mut conn = pool.acquire().await.unwrap();
    let stock = StockRepo::create(&mut conn, "Tote warehouse").await.unwrap();
    StockRepo::link_rule(&mut conn, stock.id, rule.id).await.unwrap();
    StockRepo::upsert_level(&mut conn, stock.id, "TOTE-1", 5).await.unwrap();
    drop(conn);

    let err = engine(&pool).allocate_order(order.id).await.unwrap_err();
    match err {
        EngineError::InsufficientStock { sku, have, need } => {
            assert_eq!(sku, "TOTE-1");
            assert_eq!(have, 2);
            assert_eq!(need, 4);
        }
        other => panic!("expected InsufficientStock, got {other}"),
    }

    // Nothing persisted: no assignments for either item, stock untouched.
    let mut conn = pool.acquire().await.unwrap();
    assert!(!BatchItemRepo::exists_for_order_item(&mut conn, first.id).await.unwrap());
    assert!(!BatchItemRepo::exists_for_order_item(&mut conn, second.id).await.unwrap());
    let level = StockRepo::find_level_for_rule_sku(&mut conn, rule.id, "TOTE-1")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(level.quantity, 5);
}

/// An order item with no matching rule is skipped without failing the
/// rest of the order.
#[sqlx::test(migrations = "../../db/migrations")]
async fn item_without_rule_is_skipped(pool: PgPool) {
    let store = seed_store(&pool).await;
    seed_rule(&pool, &store, "Mugs", None, true, false).await;
    let mugs = seed_product(&pool, &store, "Mugs").await;
    let posters = seed_product(&pool, &store, "Posters").await;
    let order = seed_order(&pool, &store, 5001).await;
    seed_order_item(&pool, &order, &mugs, None, 2).await;
    let unruled = seed_order_item(&pool, &order, &posters, None, 2).await;

    let assignments = engine(&pool).allocate_order(order.id).await.unwrap();
    assert_eq!(assignments.len(), 1);

    let mut conn = pool.acquire().await.unwrap();
    assert!(!BatchItemRepo::exists_for_order_item(&mut conn, unruled.id).await.unwrap());
}
