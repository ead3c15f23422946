//! Integration tests for scans, cascades, auto-status, replacement, and
//! terminal order transitions.

mod common;

use sqlx::PgPool;

use presshub_core::error::CoreError;
use presshub_core::status::ProductionStatus;
use presshub_core::unit_flow::ScanOutcome;
use presshub_db::models::order::Order;
use presshub_db::models::unit::BatchItemUnit;
use presshub_db::repositories::{
    BatchFileRepo, BatchItemRepo, BatchRepo, OrderRepo, UnitRepo,
};
use presshub_engine::replacement::ReplacementReason;
use presshub_engine::{Engine, EngineError, PlatformSideEffect};

use common::*;

/// Allocate one POD order and return (engine, order, units of the first
/// batch item).
async fn allocate_single_batch(
    pool: &PgPool,
    quantity: i32,
) -> (Engine, Order, Vec<BatchItemUnit>) {
    let store = seed_store(pool).await;
    seed_rule(pool, &store, "Mugs", None, true, false).await;
    let product = seed_product(pool, &store, "Mugs").await;
    let order = seed_order(pool, &store, 9001).await;
    let item = seed_order_item(pool, &order, &product, None, quantity).await;

    let eng = engine(pool);
    eng.allocate_order(order.id).await.unwrap();

    let mut conn = pool.acquire().await.unwrap();
    let batch_items = BatchItemRepo::list_for_order_item(&mut conn, item.id).await.unwrap();
    assert_eq!(batch_items.len(), 1);
    let units = UnitRepo::list_for_batch_item(&mut conn, batch_items[0].id).await.unwrap();
    (eng, order, units)
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn scan_flow_advances_units_batch_and_order(pool: PgPool) {
    let (eng, order, _) = allocate_single_batch(&pool, 10).await;

    let mut conn = pool.acquire().await.unwrap();
    let batch = BatchRepo::list_for_order(&mut conn, order.id).await.unwrap()[0].clone();
    // Full batch auto-promoted and received its printer scan code.
    assert_eq!(batch.status(), ProductionStatus::Batched);
    let batch_token = batch.qr_token.clone().unwrap();
    drop(conn);

    // Mint unit labels, move the batch to the printer.
    let codes = eng.generate_batch_codes(batch.id).await.unwrap();
    assert_eq!(codes.unit_codes.len(), 10);
    eng.override_batch_status(batch.id, ProductionStatus::Printing)
        .await
        .unwrap();

    // Printer scan against the freshly minted batch token.
    let result = eng.scan_batch_printed(&codes.batch_token).await.unwrap();
    assert_eq!(result.outcome, ScanOutcome::Applied);
    // The pre-regeneration token is gone.
    assert!(eng.scan_batch_printed(&batch_token).await.is_err());

    let mut conn = pool.acquire().await.unwrap();
    let order_row = OrderRepo::find_by_id(&mut conn, order.id).await.unwrap().unwrap();
    assert_eq!(order_row.status(), ProductionStatus::Printed);
    drop(conn);

    // Cutter: wrong-stage packing scan is rejected with the current
    // status; duplicate cut scans are tolerated.
    let first_unit = &codes.unit_codes[0];
    let err = eng.scan_unit_packed(&first_unit.token).await.unwrap_err();
    match err {
        EngineError::Core(CoreError::Precondition { current, .. }) => {
            assert_eq!(current, ProductionStatus::Printed);
        }
        other => panic!("expected precondition error, got {other}"),
    }

    for code in &codes.unit_codes {
        let result = eng.scan_unit_cut(&code.token).await.unwrap();
        assert_eq!(result.outcome, ScanOutcome::Applied);
    }
    let dup = eng.scan_unit_cut(&first_unit.token).await.unwrap();
    assert_eq!(dup.outcome, ScanOutcome::AlreadyDone);

    // All units cut: the cascade promoted the batch.
    let mut conn = pool.acquire().await.unwrap();
    let batch_row = BatchRepo::find_by_id(&mut conn, batch.id).await.unwrap().unwrap();
    assert_eq!(batch_row.status(), ProductionStatus::Cut);
    drop(conn);

    // Fulfillment packs everything: the order completes.
    for code in &codes.unit_codes {
        eng.scan_unit_packed(&code.token).await.unwrap();
    }
    let mut conn = pool.acquire().await.unwrap();
    let order_row = OrderRepo::find_by_id(&mut conn, order.id).await.unwrap().unwrap();
    assert_eq!(order_row.status(), ProductionStatus::Completed);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn unknown_scan_token_is_not_found(pool: PgPool) {
    let eng = engine(&pool);
    let err = eng.scan_unit_cut("deadbeefdeadbeefdeadbeefdeadbeef").await.unwrap_err();
    assert!(matches!(
        err,
        EngineError::Core(CoreError::TokenNotFound { .. })
    ));
}

/// Property: an order whose every unit reaches FULFILLED transitions to
/// FULFILLED and yields exactly one fulfillment side effect.
#[sqlx::test(migrations = "../../db/migrations")]
async fn full_fulfillment_fires_exactly_one_side_effect(pool: PgPool) {
    let (eng, order, _) = allocate_single_batch(&pool, 2).await;

    let mut conn = pool.acquire().await.unwrap();
    let batch = BatchRepo::list_for_order(&mut conn, order.id).await.unwrap()[0].clone();
    drop(conn);

    let codes = eng.generate_batch_codes(batch.id).await.unwrap();
    // Walk the whole batch to PACKED via the bulk override.
    let effects = eng
        .override_batch_status(batch.id, ProductionStatus::Packed)
        .await
        .unwrap();
    assert!(effects.is_empty());

    let first = eng.scan_unit_fulfilled(&codes.unit_codes[0].token).await.unwrap();
    assert!(first.side_effects.is_empty(), "partial fulfillment must not fire");

    let second = eng.scan_unit_fulfilled(&codes.unit_codes[1].token).await.unwrap();
    assert_eq!(
        second.side_effects,
        vec![PlatformSideEffect::Fulfill { order_id: order.id }]
    );

    let mut conn = pool.acquire().await.unwrap();
    let order_row = OrderRepo::find_by_id(&mut conn, order.id).await.unwrap().unwrap();
    assert_eq!(order_row.status(), ProductionStatus::Fulfilled);
}

/// Property: replacement cancels the defective unit, creates exactly one
/// fresh WAITING_BATCH unit, and leaves the order item's derived status
/// unchanged in meaning.
#[sqlx::test(migrations = "../../db/migrations")]
async fn replacement_round_trip(pool: PgPool) {
    let (eng, order, units) = allocate_single_batch(&pool, 2).await;

    let defective = units[0].clone();

    let (outcome, _effects) = eng
        .replace_unit(defective.id, ReplacementReason::Reprint)
        .await
        .unwrap();
    assert_eq!(outcome.cancelled_unit_id, defective.id);
    assert_eq!(outcome.reason, ReplacementReason::Reprint);

    let mut conn = pool.acquire().await.unwrap();
    let cancelled = UnitRepo::find_by_id(&mut conn, defective.id).await.unwrap().unwrap();
    assert_eq!(cancelled.status(), ProductionStatus::Cancelled);

    let replacement = UnitRepo::find_by_id(&mut conn, outcome.new_unit_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(replacement.status(), ProductionStatus::WaitingBatch);
    assert!(replacement.qr_token.is_some());
    assert_eq!(replacement.qr_token.as_deref(), Some(outcome.new_unit_token.as_str()));

    // The open WAITING_BATCH batch had spare capacity, so the
    // replacement landed in the same batch.
    assert_eq!(outcome.old_batch_id, outcome.new_batch_id);
    let batch = BatchRepo::find_by_id(&mut conn, outcome.new_batch_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(batch.capacity, 3);

    // The order item still reads WAITING_BATCH from its active units.
    let order_row = OrderRepo::find_by_id(&mut conn, order.id).await.unwrap().unwrap();
    assert_eq!(order_row.status(), ProductionStatus::WaitingBatch);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn replacement_rejects_terminal_unit(pool: PgPool) {
    let (eng, _, units) = allocate_single_batch(&pool, 2).await;

    let (outcome, _) = eng
        .replace_unit(units[0].id, ReplacementReason::Redesign)
        .await
        .unwrap();

    // The cancelled unit cannot be replaced again.
    let err = eng
        .replace_unit(outcome.cancelled_unit_id, ReplacementReason::Redesign)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        EngineError::Core(CoreError::Precondition {
            current: ProductionStatus::Cancelled,
            ..
        })
    ));
}

/// Design files outrank capacity in the auto-status decision; manual
/// statuses are never auto-overridden.
#[sqlx::test(migrations = "../../db/migrations")]
async fn auto_promote_follows_files_then_capacity(pool: PgPool) {
    let (eng, order, _) = allocate_single_batch(&pool, 3).await;

    let mut conn = pool.acquire().await.unwrap();
    let batch = BatchRepo::list_for_order(&mut conn, order.id).await.unwrap()[0].clone();
    assert_eq!(batch.status(), ProductionStatus::WaitingBatch);

    BatchFileRepo::create(&mut conn, batch.id, "front.pdf", Some("application/pdf"), Some(1024))
        .await
        .unwrap();
    drop(conn);

    let (new_status, _) = eng.auto_promote(batch.id).await.unwrap();
    assert_eq!(new_status, Some(ProductionStatus::Designed));

    // Re-running is a no-op.
    let (again, _) = eng.auto_promote(batch.id).await.unwrap();
    assert_eq!(again, None);

    // A manual transition is out of the auto-updatable range and sticks.
    eng.override_batch_status(batch.id, ProductionStatus::Printing)
        .await
        .unwrap();
    let (after_manual, _) = eng.auto_promote(batch.id).await.unwrap();
    assert_eq!(after_manual, None);

    let mut conn = pool.acquire().await.unwrap();
    let batch_row = BatchRepo::find_by_id(&mut conn, batch.id).await.unwrap().unwrap();
    assert_eq!(batch_row.status(), ProductionStatus::Printing);
}

/// Marking every item of a fulfilled order returned yields the refund
/// side effect once.
#[sqlx::test(migrations = "../../db/migrations")]
async fn full_return_fires_refund_effect(pool: PgPool) {
    let (eng, order, units) = allocate_single_batch(&pool, 2).await;

    let mut conn = pool.acquire().await.unwrap();
    let batch = BatchRepo::list_for_order(&mut conn, order.id).await.unwrap()[0].clone();
    let order_item_id = BatchItemRepo::find_by_id(&mut conn, units[0].batch_item_id)
        .await
        .unwrap()
        .unwrap()
        .order_item_id;
    drop(conn);

    eng.override_batch_status(batch.id, ProductionStatus::Fulfilled)
        .await
        .unwrap();

    let effects = eng.mark_order_item_returned(order_item_id).await.unwrap();
    assert_eq!(effects, vec![PlatformSideEffect::Refund { order_id: order.id }]);

    let mut conn = pool.acquire().await.unwrap();
    let order_row = OrderRepo::find_by_id(&mut conn, order.id).await.unwrap().unwrap();
    assert_eq!(order_row.status(), ProductionStatus::Returned);
}

/// Returning items still in production is rejected with the offending
/// status.
#[sqlx::test(migrations = "../../db/migrations")]
async fn early_return_is_rejected(pool: PgPool) {
    let (eng, _, units) = allocate_single_batch(&pool, 2).await;

    let mut conn = pool.acquire().await.unwrap();
    let order_item_id = BatchItemRepo::find_by_id(&mut conn, units[0].batch_item_id)
        .await
        .unwrap()
        .unwrap()
        .order_item_id;
    drop(conn);

    let err = eng.mark_order_item_returned(order_item_id).await.unwrap_err();
    assert!(matches!(
        err,
        EngineError::Core(CoreError::Precondition {
            current: ProductionStatus::WaitingBatch,
            ..
        })
    ));
}
