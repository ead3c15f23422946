//! Main stock entities: named stock pools with per-SKU quantity rows,
//! consulted and decremented for stock-requiring classification rules.

use serde::Serialize;
use sqlx::FromRow;

use presshub_core::types::{DbId, Timestamp};

/// A row from the `main_stocks` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct MainStock {
    pub id: DbId,
    pub name: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// A row from the `stock_levels` table: available quantity for one SKU
/// within a main stock.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct StockLevel {
    pub id: DbId,
    pub main_stock_id: DbId,
    pub sku: String,
    pub quantity: i32,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}
