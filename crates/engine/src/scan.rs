//! Scan-driven transitions and manual overrides.
//!
//! Production stations address work by scan token: the printer scans a
//! batch to mark it printed, the cutter and fulfillment stations scan
//! individual units. Every accepted transition cascades inside the same
//! transaction; duplicate scans come back as `AlreadyDone`.

use sqlx::PgConnection;

use presshub_core::error::CoreError;
use presshub_core::status::ProductionStatus;
use presshub_core::types::DbId;
use presshub_core::unit_flow::{apply_scan, ScanOutcome};
use presshub_db::repositories::{
    BatchItemRepo, BatchRepo, OrderItemRepo, UnitRepo,
};

use crate::cascade;
use crate::error::EngineError;
use crate::sync::PlatformSideEffect;
use crate::Engine;

/// Result of a scan operation.
#[derive(Debug)]
pub struct ScanResult {
    pub outcome: ScanOutcome,
    /// The batch the scanned entity belongs to (for redirecting the
    /// scanning device back to the right page).
    pub batch_id: DbId,
    pub side_effects: Vec<PlatformSideEffect>,
}

impl Engine {
    /// Printer scan: mark a whole batch PRINTED.
    ///
    /// Requires the batch to be PRINTING; the transition fans out to the
    /// batch's items, their units, the owning order items, and every
    /// affected order.
    pub async fn scan_batch_printed(&self, token: &str) -> Result<ScanResult, EngineError> {
        let mut tx = self.pool().begin().await?;

        let batch = BatchRepo::find_by_token(&mut *tx, token)
            .await?
            .ok_or_else(|| CoreError::TokenNotFound {
                entity: "Batch",
                token: token.to_string(),
            })?;

        if batch.status() == ProductionStatus::Printed {
            return Ok(ScanResult {
                outcome: ScanOutcome::AlreadyDone,
                batch_id: batch.id,
                side_effects: Vec::new(),
            });
        }
        if batch.status() != ProductionStatus::Printing {
            return Err(CoreError::Precondition {
                expected: ProductionStatus::Printing.as_str().to_string(),
                current: batch.status(),
            }
            .into());
        }

        let side_effects =
            set_batch_status_cascading(&mut *tx, batch.id, ProductionStatus::Printed).await?;
        tx.commit().await?;

        tracing::info!(batch = %batch.name, "Batch marked PRINTED by scan");
        Ok(ScanResult {
            outcome: ScanOutcome::Applied,
            batch_id: batch.id,
            side_effects,
        })
    }

    /// Cutter scan: mark one unit CUT (requires PRINTED).
    pub async fn scan_unit_cut(&self, token: &str) -> Result<ScanResult, EngineError> {
        self.scan_unit(token, ProductionStatus::Cut).await
    }

    /// Fulfillment scan: mark one unit PACKED (requires CUT).
    pub async fn scan_unit_packed(&self, token: &str) -> Result<ScanResult, EngineError> {
        self.scan_unit(token, ProductionStatus::Packed).await
    }

    /// Handoff scan: mark one unit FULFILLED (requires PACKED or an item
    /// already moved into the FULFILLMENT stage).
    pub async fn scan_unit_fulfilled(&self, token: &str) -> Result<ScanResult, EngineError> {
        self.scan_unit(token, ProductionStatus::Fulfilled).await
    }

    /// Shared unit-scan path: guard, write, cascade.
    async fn scan_unit(
        &self,
        token: &str,
        target: ProductionStatus,
    ) -> Result<ScanResult, EngineError> {
        let mut tx = self.pool().begin().await?;

        let unit = UnitRepo::find_by_token(&mut *tx, token)
            .await?
            .ok_or_else(|| CoreError::TokenNotFound {
                entity: "BatchItemUnit",
                token: token.to_string(),
            })?;

        let batch_item = BatchItemRepo::find_by_id(&mut *tx, unit.batch_item_id)
            .await?
            .ok_or(CoreError::NotFound {
                entity: "BatchItem",
                id: unit.batch_item_id,
            })?;

        // Precondition guard: tolerate duplicate scans, reject wrong-stage
        // scans with the current status.
        let outcome = apply_scan(unit.status(), target)?;
        if outcome == ScanOutcome::AlreadyDone {
            return Ok(ScanResult {
                outcome,
                batch_id: batch_item.batch_id,
                side_effects: Vec::new(),
            });
        }

        UnitRepo::set_status(&mut *tx, unit.id, target.id()).await?;

        let order_item = OrderItemRepo::find_by_id(&mut *tx, batch_item.order_item_id)
            .await?
            .ok_or(CoreError::NotFound {
                entity: "OrderItem",
                id: batch_item.order_item_id,
            })?;

        let cascade_outcome = cascade::propagate(&mut *tx, order_item.order_id).await?;
        tx.commit().await?;

        tracing::info!(unit_id = unit.id, status = %target, "Unit advanced by scan");
        Ok(ScanResult {
            outcome,
            batch_id: batch_item.batch_id,
            side_effects: cascade_outcome.side_effect.into_iter().collect(),
        })
    }

    /// Manual override: write a batch status chosen by an operator and
    /// cascade it through items, units, and owning orders. This is the
    /// only path where a derived status is set by user choice.
    pub async fn override_batch_status(
        &self,
        batch_id: DbId,
        status: ProductionStatus,
    ) -> Result<Vec<PlatformSideEffect>, EngineError> {
        let mut tx = self.pool().begin().await?;

        BatchRepo::find_by_id(&mut *tx, batch_id)
            .await?
            .ok_or(CoreError::NotFound {
                entity: "Batch",
                id: batch_id,
            })?;

        let side_effects = set_batch_status_cascading(&mut *tx, batch_id, status).await?;
        tx.commit().await?;

        tracing::info!(batch_id, status = %status, "Batch status overridden");
        Ok(side_effects)
    }

    /// Mark every fulfilled unit of an order item RETURNED, cascading so
    /// a fully returned order triggers refund creation.
    pub async fn mark_order_item_returned(
        &self,
        order_item_id: DbId,
    ) -> Result<Vec<PlatformSideEffect>, EngineError> {
        let mut tx = self.pool().begin().await?;

        let order_item = OrderItemRepo::find_by_id(&mut *tx, order_item_id)
            .await?
            .ok_or(CoreError::NotFound {
                entity: "OrderItem",
                id: order_item_id,
            })?;

        // Returns only make sense after the goods left the building.
        let statuses =
            cascade::decode_statuses(UnitRepo::statuses_for_order_item(&mut *tx, order_item_id).await?);
        let returnable = [
            ProductionStatus::Fulfilled,
            ProductionStatus::Packed,
            ProductionStatus::Completed,
        ];
        for status in statuses
            .iter()
            .filter(|s| **s != ProductionStatus::Cancelled)
        {
            if !returnable.contains(status) {
                return Err(CoreError::Precondition {
                    expected: "FULFILLED, PACKED, or COMPLETED".to_string(),
                    current: *status,
                }
                .into());
            }
        }

        UnitRepo::set_status_for_order_item(
            &mut *tx,
            order_item_id,
            ProductionStatus::Returned.id(),
        )
        .await?;

        let outcome = cascade::propagate(&mut *tx, order_item.order_id).await?;
        tx.commit().await?;

        tracing::info!(order_item_id, "Order item marked RETURNED");
        Ok(outcome.side_effect.into_iter().collect())
    }
}

/// Write a batch-level status through the batch, its items, their units,
/// the owning order items, and every affected order — one transaction.
async fn set_batch_status_cascading(
    conn: &mut PgConnection,
    batch_id: DbId,
    status: ProductionStatus,
) -> Result<Vec<PlatformSideEffect>, EngineError> {
    BatchRepo::set_status(&mut *conn, batch_id, status.id()).await?;
    BatchItemRepo::set_status_for_batch(&mut *conn, batch_id, status.id()).await?;
    UnitRepo::set_status_for_batch(&mut *conn, batch_id, status.id()).await?;
    OrderItemRepo::set_status_for_batch(&mut *conn, batch_id, status.id()).await?;

    let affected = OrderItemRepo::list_for_batch(&mut *conn, batch_id).await?;
    let mut order_ids: Vec<DbId> = affected.iter().map(|item| item.order_id).collect();
    order_ids.sort();
    order_ids.dedup();

    let mut side_effects = Vec::new();
    for order_id in order_ids {
        let outcome = cascade::propagate(&mut *conn, order_id).await?;
        side_effects.extend(outcome.side_effect);
    }
    Ok(side_effects)
}
