//! Design attachment metadata for batches.

use serde::Serialize;
use sqlx::FromRow;

use presshub_core::types::{DbId, Timestamp};

/// A row from the `batch_files` table. The engine only cares whether a
/// batch has at least one attached file; the rest is display metadata.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct BatchFile {
    pub id: DbId,
    pub batch_id: DbId,
    pub name: String,
    pub mime_type: Option<String>,
    pub size_bytes: Option<i64>,
    pub created_at: Timestamp,
}
