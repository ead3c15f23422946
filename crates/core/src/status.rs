//! Production status codes and the status-priority resolver.
//!
//! One closed enum covers units, batch items, batches, order items, and
//! orders; the seed data in `production_statuses` uses the same 1-based
//! ids. Aggregation never relies on declaration order — the two priority
//! lists below are the explicit, ordered source of truth.

use serde::{Deserialize, Serialize};

use crate::types::StatusId;

/// Lifecycle status of anything moving through the production pipeline.
///
/// The linear pipeline runs Pending → WaitingBatch → Batched → Designing →
/// Designed → Printing → Printed → Cutting → Cut → Fulfillment →
/// Fulfilled/Packed → Completed. Cancelled and Returned are side states:
/// Cancelled is terminal and only ever set by the replacement workflow or
/// an order-level cancellation; Returned is reachable after fulfillment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProductionStatus {
    Pending,
    WaitingBatch,
    Batched,
    Designing,
    Designed,
    Printing,
    Printed,
    Cutting,
    Cut,
    Fulfillment,
    Fulfilled,
    Packed,
    Completed,
    Cancelled,
    Returned,
}

/// Every status, in seed-data order.
pub const ALL_STATUSES: [ProductionStatus; 15] = [
    ProductionStatus::Pending,
    ProductionStatus::WaitingBatch,
    ProductionStatus::Batched,
    ProductionStatus::Designing,
    ProductionStatus::Designed,
    ProductionStatus::Printing,
    ProductionStatus::Printed,
    ProductionStatus::Cutting,
    ProductionStatus::Cut,
    ProductionStatus::Fulfillment,
    ProductionStatus::Fulfilled,
    ProductionStatus::Packed,
    ProductionStatus::Completed,
    ProductionStatus::Cancelled,
    ProductionStatus::Returned,
];

impl ProductionStatus {
    /// Database status ID, matching the `production_statuses` seed rows.
    pub fn id(self) -> StatusId {
        match self {
            Self::Pending => 1,
            Self::WaitingBatch => 2,
            Self::Batched => 3,
            Self::Designing => 4,
            Self::Designed => 5,
            Self::Printing => 6,
            Self::Printed => 7,
            Self::Cutting => 8,
            Self::Cut => 9,
            Self::Fulfillment => 10,
            Self::Fulfilled => 11,
            Self::Packed => 12,
            Self::Completed => 13,
            Self::Cancelled => 14,
            Self::Returned => 15,
        }
    }

    /// Reverse of [`id`](Self::id). `None` for unknown ids.
    pub fn from_id(id: StatusId) -> Option<Self> {
        ALL_STATUSES.iter().copied().find(|s| s.id() == id)
    }

    /// Wire representation used by the API and the original webhook payloads.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::WaitingBatch => "WAITING_BATCH",
            Self::Batched => "BATCHED",
            Self::Designing => "DESIGNING",
            Self::Designed => "DESIGNED",
            Self::Printing => "PRINTING",
            Self::Printed => "PRINTED",
            Self::Cutting => "CUTTING",
            Self::Cut => "CUT",
            Self::Fulfillment => "FULFILLMENT",
            Self::Fulfilled => "FULFILLED",
            Self::Packed => "PACKED",
            Self::Completed => "COMPLETED",
            Self::Cancelled => "CANCELLED",
            Self::Returned => "RETURNED",
        }
    }

    /// Parse the wire representation. `None` for unknown strings.
    pub fn parse(value: &str) -> Option<Self> {
        ALL_STATUSES.iter().copied().find(|s| s.as_str() == value)
    }

    /// Terminal states are never advanced by scans or the auto-status engine.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled | Self::Returned)
    }
}

impl std::fmt::Display for ProductionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Priority lists
// ---------------------------------------------------------------------------

/// Aggregation priority for the unit → batch-item → batch line.
///
/// Most-advanced stage first; the terminal failure states sit at the tail
/// so a mixed set never collapses to Cancelled/Returned while active units
/// remain.
pub const UNIT_STATUS_PRIORITY: [ProductionStatus; 15] = [
    ProductionStatus::Completed,
    ProductionStatus::Packed,
    ProductionStatus::Fulfilled,
    ProductionStatus::Fulfillment,
    ProductionStatus::Cut,
    ProductionStatus::Cutting,
    ProductionStatus::Printed,
    ProductionStatus::Printing,
    ProductionStatus::Designed,
    ProductionStatus::Designing,
    ProductionStatus::Batched,
    ProductionStatus::WaitingBatch,
    ProductionStatus::Pending,
    ProductionStatus::Cancelled,
    ProductionStatus::Returned,
];

/// Aggregation priority for the order level: earliest stage first, so an
/// order is always as unfinished as its least-finished item. Returned and
/// Cancelled at the tail only matter once no active stage remains.
pub const ORDER_STAGE_PRIORITY: [ProductionStatus; 15] = [
    ProductionStatus::Pending,
    ProductionStatus::WaitingBatch,
    ProductionStatus::Batched,
    ProductionStatus::Designing,
    ProductionStatus::Designed,
    ProductionStatus::Printing,
    ProductionStatus::Printed,
    ProductionStatus::Cutting,
    ProductionStatus::Cut,
    ProductionStatus::Fulfillment,
    ProductionStatus::Fulfilled,
    ProductionStatus::Packed,
    ProductionStatus::Completed,
    ProductionStatus::Returned,
    ProductionStatus::Cancelled,
];

// ---------------------------------------------------------------------------
// Resolvers
// ---------------------------------------------------------------------------

/// Derive one aggregate status from a set of child unit statuses.
///
/// Empty input falls back to WaitingBatch (a batch item exists but has no
/// units yet). A homogeneous set short-circuits to its single value;
/// otherwise the first [`UNIT_STATUS_PRIORITY`] entry present wins.
pub fn resolve_unit_statuses(statuses: &[ProductionStatus]) -> ProductionStatus {
    let Some(first) = statuses.first() else {
        return ProductionStatus::WaitingBatch;
    };

    if statuses.iter().all(|s| s == first) {
        return *first;
    }

    for candidate in UNIT_STATUS_PRIORITY {
        if statuses.contains(&candidate) {
            return candidate;
        }
    }

    ProductionStatus::WaitingBatch
}

/// Like [`resolve_unit_statuses`], but ignores Cancelled units.
///
/// Used while a replacement is in flight: the cancelled unit stays on the
/// old batch item for traceability and must not drag the aggregate down.
/// A set that is entirely Cancelled resolves to Cancelled.
pub fn resolve_active_unit_statuses(statuses: &[ProductionStatus]) -> ProductionStatus {
    let active: Vec<ProductionStatus> = statuses
        .iter()
        .copied()
        .filter(|s| *s != ProductionStatus::Cancelled)
        .collect();

    if active.is_empty() && !statuses.is_empty() {
        return ProductionStatus::Cancelled;
    }

    resolve_unit_statuses(&active)
}

/// Outcome of order-level aggregation.
///
/// The three terminal outcomes carry platform side effects (fulfillment +
/// carrier booking, cancellation, refund); `Stage` is a plain status write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderOutcome {
    Stage(ProductionStatus),
    Fulfilled,
    Cancelled,
    Returned,
}

impl OrderOutcome {
    /// The status to persist for this outcome.
    pub fn status(self) -> ProductionStatus {
        match self {
            Self::Stage(status) => status,
            Self::Fulfilled => ProductionStatus::Fulfilled,
            Self::Cancelled => ProductionStatus::Cancelled,
            Self::Returned => ProductionStatus::Returned,
        }
    }
}

/// Derive the order outcome from every unit status under the order (plus
/// the own status of any stock-only item without batch links).
///
/// Cancelled units are excluded before the unanimity checks so a single
/// replaced-and-cancelled unit cannot keep an otherwise fulfilled order
/// from reaching its terminal outcome; an order whose every unit is
/// Cancelled still resolves to Cancelled. Returns `None` when there is
/// nothing to aggregate, leaving the order untouched.
pub fn resolve_order_statuses(statuses: &[ProductionStatus]) -> Option<OrderOutcome> {
    if statuses.is_empty() {
        return None;
    }

    let active: Vec<ProductionStatus> = statuses
        .iter()
        .copied()
        .filter(|s| *s != ProductionStatus::Cancelled)
        .collect();

    if active.is_empty() {
        return Some(OrderOutcome::Cancelled);
    }

    if active.iter().all(|s| *s == ProductionStatus::Fulfilled) {
        return Some(OrderOutcome::Fulfilled);
    }
    if active.iter().all(|s| *s == ProductionStatus::Returned) {
        return Some(OrderOutcome::Returned);
    }
    // A fully packed order is complete; no platform side effect attached.
    if active.iter().all(|s| *s == ProductionStatus::Packed) {
        return Some(OrderOutcome::Stage(ProductionStatus::Completed));
    }

    // FULFILLED is excluded from the stage walk: an order only becomes
    // FULFILLED by unanimity above, so the fulfillment side effect cannot
    // be suppressed by an earlier partial-fulfillment status write.
    ORDER_STAGE_PRIORITY
        .iter()
        .copied()
        .filter(|candidate| *candidate != ProductionStatus::Fulfilled)
        .find(|candidate| active.contains(candidate))
        .map(OrderOutcome::Stage)
}

// ---------------------------------------------------------------------------
// Auto-status decision
// ---------------------------------------------------------------------------

/// Batch statuses the auto-status engine is allowed to overwrite. A manual
/// or terminal status set elsewhere is never auto-overridden.
pub const AUTO_UPDATABLE_STATUSES: [ProductionStatus; 4] = [
    ProductionStatus::Pending,
    ProductionStatus::WaitingBatch,
    ProductionStatus::Batched,
    ProductionStatus::Designing,
];

/// Whether the auto-status engine may act on a batch in `status`.
pub fn is_auto_updatable(status: ProductionStatus) -> bool {
    AUTO_UPDATABLE_STATUSES.contains(&status)
}

/// Compute a batch's automatic status from capacity fill and design-file
/// presence. Attached design files take priority over capacity.
pub fn auto_batch_status(
    capacity: i32,
    max_capacity: i32,
    has_design_files: bool,
) -> ProductionStatus {
    if has_design_files {
        ProductionStatus::Designed
    } else if capacity == 0 {
        ProductionStatus::Pending
    } else if capacity < max_capacity {
        ProductionStatus::WaitingBatch
    } else {
        ProductionStatus::Batched
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use ProductionStatus::*;

    // -- ids and parsing ----------------------------------------------------

    #[test]
    fn ids_are_unique_and_roundtrip() {
        for status in ALL_STATUSES {
            assert_eq!(ProductionStatus::from_id(status.id()), Some(status));
        }
        let mut ids: Vec<i16> = ALL_STATUSES.iter().map(|s| s.id()).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), ALL_STATUSES.len());
    }

    #[test]
    fn wire_strings_roundtrip() {
        for status in ALL_STATUSES {
            assert_eq!(ProductionStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(ProductionStatus::parse("BOGUS"), None);
    }

    #[test]
    fn serde_uses_wire_representation() {
        let json = serde_json::to_string(&WaitingBatch).unwrap();
        assert_eq!(json, "\"WAITING_BATCH\"");
        let back: ProductionStatus = serde_json::from_str(&json).unwrap();
        assert_eq!(back, WaitingBatch);
    }

    // -- unit resolver ------------------------------------------------------

    #[test]
    fn empty_input_defaults_to_waiting_batch() {
        assert_eq!(resolve_unit_statuses(&[]), WaitingBatch);
    }

    #[test]
    fn homogeneous_input_short_circuits() {
        assert_eq!(resolve_unit_statuses(&[Packed, Packed]), Packed);
        assert_eq!(resolve_unit_statuses(&[Cancelled, Cancelled]), Cancelled);
    }

    #[test]
    fn most_advanced_stage_wins() {
        assert_eq!(resolve_unit_statuses(&[Printed, Printed, Cut]), Cut);
        assert_eq!(resolve_unit_statuses(&[WaitingBatch, Printing]), Printing);
        assert_eq!(resolve_unit_statuses(&[Designed, Packed, Cutting]), Packed);
    }

    #[test]
    fn terminal_states_lose_to_active_stages() {
        assert_eq!(resolve_unit_statuses(&[Cancelled, Printed]), Printed);
        assert_eq!(resolve_unit_statuses(&[Returned, Pending]), Pending);
    }

    #[test]
    fn active_resolver_ignores_cancelled() {
        assert_eq!(
            resolve_active_unit_statuses(&[Cancelled, WaitingBatch, WaitingBatch]),
            WaitingBatch
        );
        assert_eq!(resolve_active_unit_statuses(&[Cancelled, Cancelled]), Cancelled);
        assert_eq!(resolve_active_unit_statuses(&[]), WaitingBatch);
    }

    // -- order resolver -----------------------------------------------------

    #[test]
    fn order_empty_input_is_none() {
        assert_eq!(resolve_order_statuses(&[]), None);
    }

    #[test]
    fn order_terminal_rules_require_unanimity() {
        assert_eq!(
            resolve_order_statuses(&[Fulfilled, Fulfilled]),
            Some(OrderOutcome::Fulfilled)
        );
        assert_eq!(
            resolve_order_statuses(&[Cancelled, Cancelled]),
            Some(OrderOutcome::Cancelled)
        );
        assert_eq!(
            resolve_order_statuses(&[Returned, Returned, Returned]),
            Some(OrderOutcome::Returned)
        );
    }

    #[test]
    fn fully_packed_order_completes() {
        assert_eq!(
            resolve_order_statuses(&[Packed, Packed]),
            Some(OrderOutcome::Stage(Completed))
        );
    }

    #[test]
    fn order_earliest_stage_wins_on_mixed_input() {
        assert_eq!(
            resolve_order_statuses(&[Packed, WaitingBatch, Cut]),
            Some(OrderOutcome::Stage(WaitingBatch))
        );
        // Partial fulfillment never surfaces FULFILLED: unanimity is the
        // only path to the terminal outcome and its side effect.
        assert_eq!(
            resolve_order_statuses(&[Fulfilled, Packed]),
            Some(OrderOutcome::Stage(Packed))
        );
    }

    #[test]
    fn order_cancelled_units_do_not_hold_back_active_ones() {
        assert_eq!(
            resolve_order_statuses(&[Cancelled, Printed]),
            Some(OrderOutcome::Stage(Printed))
        );
        // A replaced-and-cancelled unit must not block terminal outcomes.
        assert_eq!(
            resolve_order_statuses(&[Cancelled, Fulfilled, Fulfilled]),
            Some(OrderOutcome::Fulfilled)
        );
        assert_eq!(
            resolve_order_statuses(&[Cancelled, Returned]),
            Some(OrderOutcome::Returned)
        );
    }

    // -- auto-status decision -----------------------------------------------

    #[test]
    fn design_files_beat_capacity() {
        assert_eq!(auto_batch_status(0, 10, true), Designed);
        assert_eq!(auto_batch_status(10, 10, true), Designed);
    }

    #[test]
    fn capacity_drives_status_without_files() {
        assert_eq!(auto_batch_status(0, 10, false), Pending);
        assert_eq!(auto_batch_status(4, 10, false), WaitingBatch);
        assert_eq!(auto_batch_status(10, 10, false), Batched);
    }

    #[test]
    fn auto_updatable_excludes_manual_and_terminal_statuses() {
        assert!(is_auto_updatable(Pending));
        assert!(is_auto_updatable(Designing));
        assert!(!is_auto_updatable(Printing));
        assert!(!is_auto_updatable(Completed));
        assert!(!is_auto_updatable(Cancelled));
    }
}
