//! Store entity: one connected shop on the commerce platform.

use serde::Serialize;
use sqlx::FromRow;

use presshub_core::types::{DbId, Timestamp};

/// A row from the `stores` table.
///
/// `access_token` authenticates outbound commerce calls;
/// `carrier_api_key` + `carrier_enabled` control whether full-order
/// fulfillment also books a carrier delivery.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Store {
    pub id: DbId,
    pub name: String,
    pub shop_domain: String,
    #[serde(skip_serializing)]
    pub access_token: Option<String>,
    #[serde(skip_serializing)]
    pub carrier_api_key: Option<String>,
    pub carrier_enabled: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}
