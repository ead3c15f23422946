//! Batch item entity: the portion of one order item assigned to one batch.

use serde::Serialize;
use sqlx::FromRow;

use presshub_core::status::ProductionStatus;
use presshub_core::types::{DbId, StatusId, Timestamp};

/// A row from the `batch_items` table.
///
/// `quantity` may be less than the order item's total when the item is
/// split across batches; the batch's capacity equals the sum of its item
/// quantities. The count of non-cancelled units equals `quantity`.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct BatchItem {
    pub id: DbId,
    pub batch_id: DbId,
    pub order_item_id: DbId,
    pub quantity: i32,
    pub status_id: StatusId,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl BatchItem {
    /// Decoded production status.
    pub fn status(&self) -> ProductionStatus {
        ProductionStatus::from_id(self.status_id).unwrap_or(ProductionStatus::WaitingBatch)
    }
}
