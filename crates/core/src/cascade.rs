//! Bottom-up cascade planner.
//!
//! After any leaf mutation the aggregate statuses of the whole chain —
//! batch item from its units, batch from its items, order item from its
//! units, order from its items — must be re-derived innermost first. The
//! planner works on an in-memory snapshot of the order tree and returns
//! the exact set of status writes plus any terminal platform effect, so
//! the visitation order is testable without a repository. The engine
//! loads the snapshot, runs the planner, and persists the writes inside
//! the triggering transaction.

use crate::status::{
    resolve_active_unit_statuses, resolve_order_statuses, OrderOutcome, ProductionStatus,
};
use crate::types::DbId;

// ---------------------------------------------------------------------------
// Snapshot types
// ---------------------------------------------------------------------------

/// One batch item of the order, with the statuses of all its units.
#[derive(Debug, Clone)]
pub struct BatchItemNode {
    pub batch_item_id: DbId,
    pub batch_id: DbId,
    pub status: ProductionStatus,
    pub unit_statuses: Vec<ProductionStatus>,
}

/// One order item with its batch assignments. An item without batch items
/// is a pure stock item: its own status is authoritative.
#[derive(Debug, Clone)]
pub struct OrderItemNode {
    pub order_item_id: DbId,
    pub status: ProductionStatus,
    pub batch_items: Vec<BatchItemNode>,
}

/// A batch touched by this order. `sibling_item_statuses` carries the
/// current statuses of the batch's items that belong to OTHER orders —
/// batch promotion must see the whole batch, not just this order's slice.
#[derive(Debug, Clone)]
pub struct BatchNode {
    pub batch_id: DbId,
    pub status: ProductionStatus,
    pub sibling_item_statuses: Vec<ProductionStatus>,
}

/// Snapshot of everything the cascade needs for one order.
#[derive(Debug, Clone)]
pub struct CascadeInput {
    pub order_id: DbId,
    pub order_status: ProductionStatus,
    pub items: Vec<OrderItemNode>,
    pub batches: Vec<BatchNode>,
}

// ---------------------------------------------------------------------------
// Plan types
// ---------------------------------------------------------------------------

/// One pending status write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusWrite {
    pub id: DbId,
    pub status: ProductionStatus,
}

/// Terminal order transition requiring a platform side effect. Emitted
/// only when the order status actually changes, so each terminal effect
/// fires exactly once per order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminalTransition {
    /// Every active unit fulfilled: create the platform fulfillment and,
    /// for carrier-enabled stores, book the delivery.
    Fulfilled,
    /// Every unit cancelled: cancel the platform order.
    Cancelled,
    /// Every active unit returned: create refunds per returned line item.
    Returned,
}

/// The full set of writes produced by one cascade pass, in apply order
/// (batch items, then batches, then order items, then the order).
#[derive(Debug, Clone, Default)]
pub struct CascadePlan {
    pub batch_item_writes: Vec<StatusWrite>,
    pub batch_writes: Vec<StatusWrite>,
    pub order_item_writes: Vec<StatusWrite>,
    pub order_write: Option<ProductionStatus>,
    pub terminal: Option<TerminalTransition>,
}

impl CascadePlan {
    /// True when the pass changed nothing.
    pub fn is_empty(&self) -> bool {
        self.batch_item_writes.is_empty()
            && self.batch_writes.is_empty()
            && self.order_item_writes.is_empty()
            && self.order_write.is_none()
    }
}

// ---------------------------------------------------------------------------
// Planner
// ---------------------------------------------------------------------------

/// Re-derive every aggregate status in the snapshot, innermost first.
///
/// Each level reads the already-recomputed statuses of the level below:
/// batch items from units, batches from (recomputed) item statuses, order
/// items from the union of their units, and the order from all unit
/// statuses plus the own status of batch-less items.
pub fn plan_cascade(input: &CascadeInput) -> CascadePlan {
    let mut plan = CascadePlan::default();

    // 1. Batch items from their units (cancelled units excluded so an
    //    in-flight replacement does not drag the aggregate down).
    let mut new_batch_item_statuses: Vec<(DbId, DbId, ProductionStatus)> = Vec::new();
    for item in &input.items {
        for batch_item in &item.batch_items {
            let derived = resolve_active_unit_statuses(&batch_item.unit_statuses);
            if derived != batch_item.status {
                plan.batch_item_writes.push(StatusWrite {
                    id: batch_item.batch_item_id,
                    status: derived,
                });
            }
            new_batch_item_statuses.push((batch_item.batch_item_id, batch_item.batch_id, derived));
        }
    }

    // 2. Batches: promote when all items (including siblings from other
    //    orders) now share one status.
    for batch in &input.batches {
        let mut item_statuses: Vec<ProductionStatus> = batch.sibling_item_statuses.clone();
        item_statuses.extend(
            new_batch_item_statuses
                .iter()
                .filter(|(_, batch_id, _)| *batch_id == batch.batch_id)
                .map(|(_, _, status)| *status),
        );

        if let Some(first) = item_statuses.first() {
            if item_statuses.iter().all(|s| s == first) && *first != batch.status {
                plan.batch_writes.push(StatusWrite {
                    id: batch.batch_id,
                    status: *first,
                });
            }
        }
    }

    // 3. Order items from the union of their units. Stock-only items keep
    //    their own status — it is set directly by the caller.
    for item in &input.items {
        if item.batch_items.is_empty() {
            continue;
        }
        let all_units: Vec<ProductionStatus> = item
            .batch_items
            .iter()
            .flat_map(|bi| bi.unit_statuses.iter().copied())
            .collect();
        let derived = resolve_active_unit_statuses(&all_units);
        if derived != item.status {
            plan.order_item_writes.push(StatusWrite {
                id: item.order_item_id,
                status: derived,
            });
        }
    }

    // 4. The order, from every unit status plus the own status of
    //    batch-less items.
    let mut order_inputs: Vec<ProductionStatus> = Vec::new();
    for item in &input.items {
        if item.batch_items.is_empty() {
            order_inputs.push(item.status);
        } else {
            for batch_item in &item.batch_items {
                order_inputs.extend(batch_item.unit_statuses.iter().copied());
            }
        }
    }

    if let Some(outcome) = resolve_order_statuses(&order_inputs) {
        let new_status = outcome.status();
        if new_status != input.order_status {
            plan.order_write = Some(new_status);
            plan.terminal = match outcome {
                OrderOutcome::Fulfilled => Some(TerminalTransition::Fulfilled),
                OrderOutcome::Cancelled => Some(TerminalTransition::Cancelled),
                OrderOutcome::Returned => Some(TerminalTransition::Returned),
                OrderOutcome::Stage(_) => None,
            };
        }
    }

    plan
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use ProductionStatus::*;

    fn batch_item(
        id: DbId,
        batch_id: DbId,
        status: ProductionStatus,
        units: &[ProductionStatus],
    ) -> BatchItemNode {
        BatchItemNode {
            batch_item_id: id,
            batch_id,
            status,
            unit_statuses: units.to_vec(),
        }
    }

    #[test]
    fn unchanged_tree_produces_empty_plan() {
        let input = CascadeInput {
            order_id: 1,
            order_status: WaitingBatch,
            items: vec![OrderItemNode {
                order_item_id: 10,
                status: WaitingBatch,
                batch_items: vec![batch_item(100, 5, WaitingBatch, &[WaitingBatch, WaitingBatch])],
            }],
            batches: vec![BatchNode {
                batch_id: 5,
                status: WaitingBatch,
                sibling_item_statuses: vec![],
            }],
        };
        assert!(plan_cascade(&input).is_empty());
    }

    #[test]
    fn unit_progress_bubbles_up_each_level() {
        let input = CascadeInput {
            order_id: 1,
            order_status: Printing,
            items: vec![OrderItemNode {
                order_item_id: 10,
                status: Printing,
                batch_items: vec![batch_item(100, 5, Printing, &[Printed, Printed])],
            }],
            batches: vec![BatchNode {
                batch_id: 5,
                status: Printing,
                sibling_item_statuses: vec![],
            }],
        };

        let plan = plan_cascade(&input);
        assert_eq!(plan.batch_item_writes, vec![StatusWrite { id: 100, status: Printed }]);
        assert_eq!(plan.batch_writes, vec![StatusWrite { id: 5, status: Printed }]);
        assert_eq!(plan.order_item_writes, vec![StatusWrite { id: 10, status: Printed }]);
        assert_eq!(plan.order_write, Some(Printed));
        assert_eq!(plan.terminal, None);
    }

    #[test]
    fn batch_promotion_waits_for_sibling_items() {
        // This order's slice of batch 5 is fully CUT, but a sibling item
        // from another order is still PRINTED — no promotion yet.
        let input = CascadeInput {
            order_id: 1,
            order_status: Cut,
            items: vec![OrderItemNode {
                order_item_id: 10,
                status: Cut,
                batch_items: vec![batch_item(100, 5, Cut, &[Cut, Cut])],
            }],
            batches: vec![BatchNode {
                batch_id: 5,
                status: Printed,
                sibling_item_statuses: vec![Printed],
            }],
        };

        let plan = plan_cascade(&input);
        assert!(plan.batch_writes.is_empty());
    }

    #[test]
    fn order_is_as_unfinished_as_its_least_finished_item() {
        let input = CascadeInput {
            order_id: 1,
            order_status: WaitingBatch,
            items: vec![
                OrderItemNode {
                    order_item_id: 10,
                    status: Packed,
                    batch_items: vec![batch_item(100, 5, Packed, &[Packed])],
                },
                OrderItemNode {
                    order_item_id: 11,
                    status: Cutting,
                    batch_items: vec![batch_item(101, 6, Cutting, &[Cutting])],
                },
            ],
            batches: vec![],
        };

        let plan = plan_cascade(&input);
        assert_eq!(plan.order_write, Some(Cutting));
    }

    #[test]
    fn all_fulfilled_yields_terminal_effect_exactly_once() {
        let mut input = CascadeInput {
            order_id: 1,
            order_status: Packed,
            items: vec![OrderItemNode {
                order_item_id: 10,
                status: Fulfilled,
                batch_items: vec![batch_item(100, 5, Fulfilled, &[Fulfilled, Fulfilled])],
            }],
            batches: vec![],
        };

        let plan = plan_cascade(&input);
        assert_eq!(plan.order_write, Some(Fulfilled));
        assert_eq!(plan.terminal, Some(TerminalTransition::Fulfilled));

        // Re-running on the already-updated snapshot emits nothing: the
        // fulfillment side effect fires once per order.
        input.order_status = Fulfilled;
        let second = plan_cascade(&input);
        assert_eq!(second.order_write, None);
        assert_eq!(second.terminal, None);
    }

    #[test]
    fn all_cancelled_yields_cancellation() {
        let input = CascadeInput {
            order_id: 1,
            order_status: WaitingBatch,
            items: vec![OrderItemNode {
                order_item_id: 10,
                status: WaitingBatch,
                batch_items: vec![batch_item(100, 5, WaitingBatch, &[Cancelled, Cancelled])],
            }],
            batches: vec![],
        };

        let plan = plan_cascade(&input);
        assert_eq!(plan.order_write, Some(Cancelled));
        assert_eq!(plan.terminal, Some(TerminalTransition::Cancelled));
    }

    #[test]
    fn all_returned_yields_refund_effect() {
        let input = CascadeInput {
            order_id: 1,
            order_status: Fulfilled,
            items: vec![OrderItemNode {
                order_item_id: 10,
                status: Returned,
                batch_items: vec![batch_item(100, 5, Returned, &[Returned])],
            }],
            batches: vec![],
        };

        let plan = plan_cascade(&input);
        assert_eq!(plan.order_write, Some(Returned));
        assert_eq!(plan.terminal, Some(TerminalTransition::Returned));
    }

    #[test]
    fn stock_only_items_contribute_their_own_status() {
        let input = CascadeInput {
            order_id: 1,
            order_status: Packed,
            items: vec![
                OrderItemNode {
                    order_item_id: 10,
                    status: Packed,
                    batch_items: vec![batch_item(100, 5, Packed, &[Packed])],
                },
                // Stock-only line: no batch link, own status authoritative.
                OrderItemNode {
                    order_item_id: 11,
                    status: Fulfillment,
                    batch_items: vec![],
                },
            ],
            batches: vec![],
        };

        let plan = plan_cascade(&input);
        // No write for the stock-only item itself...
        assert!(plan.order_item_writes.is_empty());
        // ...but it participates in the order aggregate.
        assert_eq!(plan.order_write, Some(Fulfillment));
    }

    #[test]
    fn replacement_leaves_order_item_meaning_unchanged() {
        // One unit was found defective and cancelled; its replacement is
        // WAITING_BATCH in another batch. The order item still reads
        // WAITING_BATCH overall.
        let input = CascadeInput {
            order_id: 1,
            order_status: WaitingBatch,
            items: vec![OrderItemNode {
                order_item_id: 10,
                status: WaitingBatch,
                batch_items: vec![
                    batch_item(100, 5, WaitingBatch, &[Cancelled, WaitingBatch]),
                    batch_item(101, 6, WaitingBatch, &[WaitingBatch]),
                ],
            }],
            batches: vec![],
        };

        let plan = plan_cascade(&input);
        assert!(plan.order_item_writes.is_empty());
        assert_eq!(plan.order_write, None);
    }
}
