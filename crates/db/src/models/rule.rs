//! Classification rules: (store, product type, optional variant title)
//! keys that decide whether an item is produced on demand, drawn from
//! stock, or both.

use serde::Serialize;
use sqlx::FromRow;

use presshub_core::types::{DbId, Timestamp};

/// A row from the `classification_rules` table.
///
/// A rule with `variant_title = NULL` is the generic rule for its product
/// type; a rule with a concrete variant title takes precedence for items
/// of that variant.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ClassificationRule {
    pub id: DbId,
    pub store_id: DbId,
    pub name: String,
    pub variant_title: Option<String>,
    pub is_pod: bool,
    pub requires_stock: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl ClassificationRule {
    /// Whether the allocator should process items under this rule at all.
    pub fn is_batchable(&self) -> bool {
        self.is_pod || self.requires_stock
    }
}
