//! Guarded transitions for individual production units.
//!
//! Scan stations on the production floor advance a unit one stage at a
//! time. Each target stage has an expected predecessor; scanning a unit
//! that is not there is rejected with the unit's current status, while
//! re-scanning a unit that already reached the target is tolerated as a
//! duplicate scan.

use crate::error::CoreError;
use crate::status::ProductionStatus;

/// Result of applying a scan to a unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanOutcome {
    /// The transition was accepted; persist the new status and cascade.
    Applied,
    /// The unit is already at the target status (duplicate scan). No-op.
    AlreadyDone,
}

/// Current statuses from which `target` may be scanned.
fn required_predecessors(target: ProductionStatus) -> &'static [ProductionStatus] {
    match target {
        ProductionStatus::Printed => &[ProductionStatus::Printing],
        ProductionStatus::Cut => &[ProductionStatus::Printed],
        ProductionStatus::Packed => &[ProductionStatus::Cut],
        ProductionStatus::Fulfilled => {
            &[ProductionStatus::Packed, ProductionStatus::Fulfillment]
        }
        _ => &[],
    }
}

/// Check a scan-driven transition from `current` to `target`.
///
/// Returns [`ScanOutcome::AlreadyDone`] when the unit already sits at the
/// target, [`ScanOutcome::Applied`] when the guard passes, and a
/// [`CoreError::Precondition`] carrying the current status otherwise.
/// Terminal units (cancelled, returned, completed) never accept scans.
pub fn apply_scan(
    current: ProductionStatus,
    target: ProductionStatus,
) -> Result<ScanOutcome, CoreError> {
    if current == target {
        return Ok(ScanOutcome::AlreadyDone);
    }

    let expected = required_predecessors(target);
    if expected.is_empty() {
        return Err(CoreError::Validation(format!(
            "{target} is not a scan-reachable status"
        )));
    }

    if current.is_terminal() || !expected.contains(&current) {
        return Err(CoreError::Precondition {
            expected: expected
                .iter()
                .map(|s| s.as_str())
                .collect::<Vec<_>>()
                .join(" or "),
            current,
        });
    }

    Ok(ScanOutcome::Applied)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use ProductionStatus::*;

    #[test]
    fn cutting_requires_printed() {
        assert_eq!(apply_scan(Printed, Cut).unwrap(), ScanOutcome::Applied);
        assert_matches!(
            apply_scan(Printing, Cut),
            Err(CoreError::Precondition { current: Printing, .. })
        );
    }

    #[test]
    fn packing_requires_cut() {
        assert_eq!(apply_scan(Cut, Packed).unwrap(), ScanOutcome::Applied);
        assert_matches!(
            apply_scan(Printed, Packed),
            Err(CoreError::Precondition { current: Printed, .. })
        );
    }

    #[test]
    fn fulfillment_accepts_packed_or_fulfillment_stage() {
        assert_eq!(apply_scan(Packed, Fulfilled).unwrap(), ScanOutcome::Applied);
        assert_eq!(
            apply_scan(Fulfillment, Fulfilled).unwrap(),
            ScanOutcome::Applied
        );
    }

    #[test]
    fn duplicate_scan_is_already_done_not_an_error() {
        assert_eq!(apply_scan(Packed, Packed).unwrap(), ScanOutcome::AlreadyDone);
        assert_eq!(apply_scan(Cut, Cut).unwrap(), ScanOutcome::AlreadyDone);
    }

    #[test]
    fn terminal_units_reject_scans() {
        assert_matches!(
            apply_scan(Cancelled, Cut),
            Err(CoreError::Precondition { current: Cancelled, .. })
        );
        assert_matches!(
            apply_scan(Returned, Packed),
            Err(CoreError::Precondition { current: Returned, .. })
        );
    }

    #[test]
    fn non_scan_targets_are_rejected_as_validation_errors() {
        assert_matches!(apply_scan(Pending, Designing), Err(CoreError::Validation(_)));
    }

    #[test]
    fn precondition_error_reports_expected_stage() {
        let err = apply_scan(WaitingBatch, Cut).unwrap_err();
        match err {
            CoreError::Precondition { expected, current } => {
                assert_eq!(expected, "PRINTED");
                assert_eq!(current, WaitingBatch);
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
