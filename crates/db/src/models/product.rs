//! Product and variant entities mirrored from the commerce platform.

use serde::Serialize;
use sqlx::FromRow;

use presshub_core::types::{DbId, Timestamp};

/// A row from the `products` table. `is_pod` is a snapshot of the
/// matching classification rule's flag at sync time.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Product {
    pub id: DbId,
    pub store_id: DbId,
    pub external_id: String,
    pub title: String,
    pub product_type: Option<String>,
    pub img_url: Option<String>,
    pub is_pod: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// A row from the `product_variants` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ProductVariant {
    pub id: DbId,
    pub product_id: DbId,
    pub external_id: String,
    pub sku: Option<String>,
    pub title: Option<String>,
    pub price: Option<f64>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}
