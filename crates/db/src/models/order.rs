//! Order and order item entities.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use presshub_core::status::ProductionStatus;
use presshub_core::types::{DbId, StatusId, Timestamp};

/// A row from the `orders` table.
///
/// `status_id` is derived from the order's items by the cascade
/// propagator; `carrier_delivery_id`/`tracking_number` are filled after a
/// successful carrier booking.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Order {
    pub id: DbId,
    pub store_id: DbId,
    pub external_id: String,
    pub order_number: i64,
    pub customer_name: Option<String>,
    pub customer_email: Option<String>,
    pub customer_phone: Option<String>,
    pub address1: Option<String>,
    pub address2: Option<String>,
    pub province: Option<String>,
    pub total_price: Option<f64>,
    pub prepaid: bool,
    pub status_id: StatusId,
    pub carrier_delivery_id: Option<String>,
    pub tracking_number: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Order {
    /// Decoded production status.
    pub fn status(&self) -> ProductionStatus {
        ProductionStatus::from_id(self.status_id).unwrap_or(ProductionStatus::Pending)
    }
}

/// DTO for inserting a new order from an inbound order event.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateOrder {
    pub store_id: DbId,
    pub external_id: String,
    pub order_number: i64,
    pub customer_name: Option<String>,
    pub customer_email: Option<String>,
    pub customer_phone: Option<String>,
    pub address1: Option<String>,
    pub address2: Option<String>,
    pub province: Option<String>,
    pub total_price: Option<f64>,
    pub prepaid: bool,
}

/// A row from the `order_items` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct OrderItem {
    pub id: DbId,
    pub order_id: DbId,
    pub product_id: DbId,
    pub variant_id: Option<DbId>,
    /// Platform line-item gid, needed to address refunds.
    pub external_line_id: Option<String>,
    pub quantity: i32,
    pub price: Option<f64>,
    pub status_id: StatusId,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl OrderItem {
    /// Decoded production status.
    pub fn status(&self) -> ProductionStatus {
        ProductionStatus::from_id(self.status_id).unwrap_or(ProductionStatus::WaitingBatch)
    }
}

/// DTO for inserting one order line item.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateOrderItem {
    pub order_id: DbId,
    pub product_id: DbId,
    pub variant_id: Option<DbId>,
    pub external_line_id: Option<String>,
    pub quantity: i32,
    pub price: Option<f64>,
}
