//! Batch entity: a bounded-capacity production lot.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use presshub_core::status::ProductionStatus;
use presshub_core::types::{DbId, StatusId, Timestamp};

/// A row from the `batches` table.
///
/// Invariants (also enforced by `ck_batches_capacity`):
/// `0 <= capacity <= max_capacity`, and `capacity` equals the sum of the
/// batch's item quantities.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Batch {
    pub id: DbId,
    pub name: String,
    pub capacity: i32,
    pub max_capacity: i32,
    pub status_id: StatusId,
    /// A batch serves either stock-requiring items or POD items, never both.
    pub handles_stock: bool,
    pub qr_token: Option<String>,
    pub qr_url: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Batch {
    /// Decoded production status. Falls back to Pending for unknown ids,
    /// which cannot occur with the FK to `production_statuses` in place.
    pub fn status(&self) -> ProductionStatus {
        ProductionStatus::from_id(self.status_id).unwrap_or(ProductionStatus::Pending)
    }

    /// Units that still fit into this batch.
    pub fn remaining_capacity(&self) -> i32 {
        self.max_capacity - self.capacity
    }
}

/// DTO for inserting a new batch.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateBatch {
    pub name: String,
    pub max_capacity: i32,
    pub handles_stock: bool,
}
