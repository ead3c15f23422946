//! Auto-status engine.
//!
//! Promotes a batch purely from capacity fill and design-file presence,
//! independent of scans or manual overrides. Idempotent and safe to call
//! redundantly; batches in manual or terminal statuses are left alone.

use sqlx::PgConnection;

use presshub_core::error::CoreError;
use presshub_core::status::{auto_batch_status, is_auto_updatable, ProductionStatus};
use presshub_core::types::DbId;
use presshub_db::repositories::{
    BatchFileRepo, BatchItemRepo, BatchRepo, OrderItemRepo, UnitRepo,
};

use crate::cascade;
use crate::codes::ScanCodeConfig;
use crate::error::EngineError;
use crate::sync::PlatformSideEffect;
use crate::Engine;

impl Engine {
    /// Recompute a batch's automatic status in its own transaction.
    ///
    /// Returns the new status when the batch changed, plus any platform
    /// side effects produced by cascading the change into owning orders.
    pub async fn auto_promote(
        &self,
        batch_id: DbId,
    ) -> Result<(Option<ProductionStatus>, Vec<PlatformSideEffect>), EngineError> {
        let mut tx = self.pool().begin().await?;
        let result = auto_promote_within(&mut *tx, batch_id, self.codes()).await?;
        tx.commit().await?;
        Ok(result)
    }
}

/// Auto-promote inside an existing transaction (allocator, replacement).
pub(crate) async fn auto_promote_within(
    conn: &mut PgConnection,
    batch_id: DbId,
    codes: &ScanCodeConfig,
) -> Result<(Option<ProductionStatus>, Vec<PlatformSideEffect>), EngineError> {
    // Lock the batch row: concurrent fills racing with this recompute
    // must serialize on the capacity they are deciding over.
    let batch = BatchRepo::find_by_id_for_update(&mut *conn, batch_id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "Batch",
            id: batch_id,
        })?;

    if !is_auto_updatable(batch.status()) {
        return Ok((None, Vec::new()));
    }

    let has_files = BatchFileRepo::count_for_batch(&mut *conn, batch_id).await? > 0;
    let new_status = auto_batch_status(batch.capacity, batch.max_capacity, has_files);
    if new_status == batch.status() {
        return Ok((None, Vec::new()));
    }

    BatchRepo::set_status(&mut *conn, batch_id, new_status.id()).await?;

    // First entry into BATCHED mints the printer-facing scan code.
    if new_status == ProductionStatus::Batched && batch.qr_token.is_none() {
        let (token, url) = codes.batch_code();
        BatchRepo::set_scan_code(&mut *conn, batch_id, &token, &url).await?;
        tracing::info!(batch_id, "Generated batch scan code");
    }

    // Cascade the promotion through the batch's items, units, and the
    // owning orders, exactly like a manual batch transition.
    let mut side_effects = Vec::new();
    let affected = OrderItemRepo::list_for_batch(&mut *conn, batch_id).await?;
    if !affected.is_empty() {
        BatchItemRepo::set_status_for_batch(&mut *conn, batch_id, new_status.id()).await?;
        UnitRepo::set_status_for_batch(&mut *conn, batch_id, new_status.id()).await?;

        let mut order_ids: Vec<DbId> = affected.iter().map(|item| item.order_id).collect();
        order_ids.sort();
        order_ids.dedup();
        for order_id in order_ids {
            let outcome = cascade::propagate(&mut *conn, order_id).await?;
            side_effects.extend(outcome.side_effect);
        }
    }

    tracing::info!(
        batch_id,
        from = %batch.status(),
        to = %new_status,
        "Batch auto-promoted"
    );
    Ok((Some(new_status), side_effects))
}
