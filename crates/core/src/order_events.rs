//! Inbound order-created event payloads.
//!
//! The commerce platform delivers validated order webhooks; the engine
//! consumes them through these types. Line items are merged by
//! (product, variant) before allocation because platforms occasionally
//! split one logical line into duplicates.

use serde::{Deserialize, Serialize};
use validator::Validate;

/// A validated order-created event, as delivered by the webhook layer.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct OrderCreatedEvent {
    /// Platform order id (numeric part of the gid).
    pub external_id: String,
    pub order_number: i64,
    pub customer_name: Option<String>,
    pub customer_email: Option<String>,
    pub customer_phone: Option<String>,
    pub address1: Option<String>,
    pub address2: Option<String>,
    pub province: Option<String>,
    pub total_price: Option<f64>,
    /// True for card/prepaid orders; COD otherwise.
    #[serde(default)]
    pub prepaid: bool,
    #[validate(nested)]
    pub line_items: Vec<EventLineItem>,
}

/// One line item of an inbound order event.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct EventLineItem {
    /// Platform line-item gid (kept for refund addressing).
    pub external_id: Option<String>,
    #[validate(length(min = 1))]
    pub product_external_id: String,
    pub variant_external_id: Option<String>,
    #[validate(range(min = 1))]
    pub quantity: i32,
    pub price: Option<f64>,
}

/// Merge duplicate line items by (product, variant), summing quantities.
/// The first occurrence's price wins. Order of first appearance is kept.
pub fn merge_line_items(line_items: Vec<EventLineItem>) -> Vec<EventLineItem> {
    let mut merged: Vec<EventLineItem> = Vec::with_capacity(line_items.len());

    for item in line_items {
        match merged.iter_mut().find(|existing| {
            existing.product_external_id == item.product_external_id
                && existing.variant_external_id == item.variant_external_id
        }) {
            Some(existing) => existing.quantity += item.quantity,
            None => merged.push(item),
        }
    }

    merged
}
