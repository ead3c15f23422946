//! Engine error taxonomy.

use presshub_core::error::CoreError;
use presshub_core::types::DbId;

/// Errors surfaced by engine flows.
///
/// `InsufficientStock` aborts the whole enclosing allocation transaction;
/// `CapacityConflict` is retryable (re-run the allocation step). Outbound
/// platform failures never appear here — they are logged by
/// [`crate::sync::PlatformSync`] after commit.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// A domain-level error (validation, not-found, precondition).
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A database error.
    #[error("Database error: {0}")]
    Db(#[from] sqlx::Error),

    /// A stock-handling allocation would drive a SKU's quantity negative.
    #[error("Insufficient stock for {sku} (have {have}, need {need})")]
    InsufficientStock { sku: String, have: i32, need: i32 },

    /// The batch capacity invariant was violated under a concurrent
    /// write. The caller should re-run the allocation step.
    #[error("Capacity conflict on batch {batch_id}; retry the allocation")]
    CapacityConflict { batch_id: DbId },
}

impl EngineError {
    /// Map a failed capacity increment to `CapacityConflict` when the
    /// database's capacity check constraint rejected it.
    pub(crate) fn from_capacity_increment(err: sqlx::Error, batch_id: DbId) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.constraint() == Some("ck_batches_capacity") {
                return Self::CapacityConflict { batch_id };
            }
        }
        Self::Db(err)
    }
}
