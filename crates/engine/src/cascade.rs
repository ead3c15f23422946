//! Cascade propagation: load, plan, persist.
//!
//! The pure bottom-up walk lives in `presshub_core::cascade`; this module
//! loads the order tree from the repository, runs the planner, and writes
//! the result back inside the caller's transaction. Terminal transitions
//! come back as side effects for the caller to execute after commit.

use sqlx::PgConnection;

use presshub_core::cascade::{
    plan_cascade, BatchItemNode, BatchNode, CascadeInput, OrderItemNode, TerminalTransition,
};
use presshub_core::error::CoreError;
use presshub_core::status::ProductionStatus;
use presshub_core::types::{DbId, StatusId};
use presshub_db::repositories::{BatchItemRepo, BatchRepo, OrderItemRepo, OrderRepo, UnitRepo};

use crate::error::EngineError;
use crate::sync::PlatformSideEffect;

/// Result of one cascade pass over an order.
#[derive(Debug, Default)]
pub struct CascadeOutcome {
    /// The order's new status, when it changed.
    pub order_status: Option<ProductionStatus>,
    /// Platform side effect to run after commit, when the order crossed
    /// a terminal boundary.
    pub side_effect: Option<PlatformSideEffect>,
}

/// Decode status ids read from the database. Unknown ids cannot occur
/// while the FK to `production_statuses` holds.
pub(crate) fn decode_statuses(ids: Vec<StatusId>) -> Vec<ProductionStatus> {
    ids.into_iter()
        .filter_map(ProductionStatus::from_id)
        .collect()
}

/// Re-derive and persist every aggregate status of `order_id`, innermost
/// first, inside the caller's transaction.
pub async fn propagate(
    conn: &mut PgConnection,
    order_id: DbId,
) -> Result<CascadeOutcome, EngineError> {
    let order = OrderRepo::find_by_id(&mut *conn, order_id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "Order",
            id: order_id,
        })?;

    // Load the full tree: items, their batch items, and unit statuses.
    let order_items = OrderItemRepo::list_for_order(&mut *conn, order_id).await?;
    let mut items = Vec::with_capacity(order_items.len());
    for order_item in &order_items {
        let batch_items = BatchItemRepo::list_for_order_item(&mut *conn, order_item.id).await?;
        let mut nodes = Vec::with_capacity(batch_items.len());
        for batch_item in batch_items {
            let unit_statuses =
                UnitRepo::statuses_for_batch_item(&mut *conn, batch_item.id).await?;
            nodes.push(BatchItemNode {
                batch_item_id: batch_item.id,
                batch_id: batch_item.batch_id,
                status: batch_item.status(),
                unit_statuses: decode_statuses(unit_statuses),
            });
        }
        items.push(OrderItemNode {
            order_item_id: order_item.id,
            status: order_item.status(),
            batch_items: nodes,
        });
    }

    // Batches touched by this order, with their sibling items' statuses.
    let touched = BatchRepo::list_for_order(&mut *conn, order_id).await?;
    let mut batches = Vec::with_capacity(touched.len());
    for batch in touched {
        let sibling_statuses =
            BatchItemRepo::sibling_statuses_for_batch(&mut *conn, batch.id, order_id).await?;
        batches.push(BatchNode {
            batch_id: batch.id,
            status: batch.status(),
            sibling_item_statuses: decode_statuses(sibling_statuses),
        });
    }

    let input = CascadeInput {
        order_id,
        order_status: order.status(),
        items,
        batches,
    };
    let plan = plan_cascade(&input);

    // Persist, innermost first.
    for write in &plan.batch_item_writes {
        BatchItemRepo::set_status(&mut *conn, write.id, write.status.id()).await?;
    }
    for write in &plan.batch_writes {
        BatchRepo::set_status(&mut *conn, write.id, write.status.id()).await?;
    }
    for write in &plan.order_item_writes {
        OrderItemRepo::set_status(&mut *conn, write.id, write.status.id()).await?;
    }
    if let Some(status) = plan.order_write {
        OrderRepo::set_status(&mut *conn, order_id, status.id()).await?;
        tracing::info!(order_id, status = %status, "Order status recomputed");
    }

    Ok(CascadeOutcome {
        order_status: plan.order_write,
        side_effect: plan.terminal.map(|t| match t {
            TerminalTransition::Fulfilled => PlatformSideEffect::Fulfill { order_id },
            TerminalTransition::Cancelled => PlatformSideEffect::Cancel { order_id },
            TerminalTransition::Returned => PlatformSideEffect::Refund { order_id },
        }),
    })
}
