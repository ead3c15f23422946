//! Batch item unit entity: one physical, individually trackable item.

use serde::Serialize;
use sqlx::FromRow;

use presshub_core::status::ProductionStatus;
use presshub_core::types::{DbId, StatusId, Timestamp};

/// A row from the `batch_item_units` table.
///
/// Units are never deleted: a defective unit is marked CANCELLED and a
/// fresh unit is created by the replacement workflow, preserving the
/// audit trail. `qr_token` addresses the unit from cutting/fulfillment
/// scan stations.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct BatchItemUnit {
    pub id: DbId,
    pub batch_item_id: DbId,
    pub status_id: StatusId,
    pub qr_token: Option<String>,
    pub qr_url: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl BatchItemUnit {
    /// Decoded production status.
    pub fn status(&self) -> ProductionStatus {
        ProductionStatus::from_id(self.status_id).unwrap_or(ProductionStatus::WaitingBatch)
    }
}
