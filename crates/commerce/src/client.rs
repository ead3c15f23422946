//! GraphQL client for the commerce platform's admin API.

use std::time::Duration;

use serde_json::{json, Value};

/// Default admin API version.
const DEFAULT_API_VERSION: &str = "2025-04";

/// HTTP timeout for a single GraphQL request. Admin mutations can be
/// slow on large shops.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

// ---------------------------------------------------------------------------
// GraphQL documents
// ---------------------------------------------------------------------------

const GET_FULFILLMENT_ORDERS_QUERY: &str = r#"
query getFulfillmentOrders($orderId: ID!) {
  order(id: $orderId) {
    id
    fulfillmentOrders(first: 10) {
      edges {
        node {
          id
          status
        }
      }
    }
  }
}
"#;

const FULFILL_ORDER_MUTATION: &str = r#"
mutation fulfillmentCreateV2($fulfillment: FulfillmentV2Input!) {
  fulfillmentCreateV2(fulfillment: $fulfillment) {
    fulfillment {
      id
      status
      createdAt
    }
    userErrors {
      field
      message
    }
  }
}
"#;

const CANCEL_ORDER_MUTATION: &str = r#"
mutation orderCancel($orderId: ID!, $refund: Boolean!, $restock: Boolean!, $reason: OrderCancelReason) {
  orderCancel(orderId: $orderId, refund: $refund, restock: $restock, reason: $reason) {
    userErrors {
      field
      message
    }
  }
}
"#;

const CREATE_REFUND_MUTATION: &str = r#"
mutation refundCreate($input: RefundInput!) {
  refundCreate(input: $input) {
    refund {
      id
    }
    userErrors {
      field
      message
    }
  }
}
"#;

const INVENTORY_ITEM_BY_SKU_QUERY: &str = r#"
query inventoryItemBySku($query: String!) {
  inventoryItems(first: 1, query: $query) {
    edges {
      node {
        id
        sku
      }
    }
  }
}
"#;

const SET_INVENTORY_QUANTITY_MUTATION: &str = r#"
mutation inventorySetOnHandQuantities($input: InventorySetOnHandQuantitiesInput!) {
  inventorySetOnHandQuantities(input: $input) {
    userErrors {
      field
      message
    }
  }
}
"#;

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

/// Errors from the commerce platform client.
#[derive(Debug, thiserror::Error)]
pub enum CommerceError {
    /// The underlying HTTP request failed (network, DNS, timeout).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The GraphQL layer returned top-level errors.
    #[error("GraphQL errors: {0}")]
    Graphql(String),

    /// A mutation reported user errors.
    #[error("Platform rejected the operation: {0}")]
    UserErrors(String),

    /// The referenced order does not exist on the platform.
    #[error("Order {0} not found on the platform")]
    OrderNotFound(String),
}

// ---------------------------------------------------------------------------
// Result types
// ---------------------------------------------------------------------------

/// A created platform fulfillment.
#[derive(Debug, Clone)]
pub struct Fulfillment {
    pub id: String,
    pub status: String,
}

/// Options for cancelling a platform order.
#[derive(Debug, Clone)]
pub struct CancelOrderOptions {
    pub refund: bool,
    pub restock: bool,
    pub reason: Option<String>,
}

impl Default for CancelOrderOptions {
    fn default() -> Self {
        Self {
            refund: true,
            restock: true,
            reason: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Client for one shop's admin GraphQL API. Credentials are passed per
/// call: one process serves many stores.
pub struct CommerceClient {
    http: reqwest::Client,
    api_version: String,
}

impl CommerceClient {
    /// Create a client with the default API version.
    pub fn new() -> Self {
        Self::with_api_version(DEFAULT_API_VERSION)
    }

    /// Create a client pinned to a specific admin API version.
    pub fn with_api_version(api_version: &str) -> Self {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("Failed to build reqwest HTTP client");
        Self {
            http,
            api_version: api_version.to_string(),
        }
    }

    /// Execute one GraphQL request against a shop.
    async fn graphql(
        &self,
        shop_domain: &str,
        access_token: &str,
        query: &str,
        variables: Value,
    ) -> Result<Value, CommerceError> {
        let url = format!(
            "https://{shop_domain}/admin/api/{}/graphql.json",
            self.api_version
        );

        let response = self
            .http
            .post(&url)
            .header("X-Shopify-Access-Token", access_token)
            .json(&json!({ "query": query, "variables": variables }))
            .send()
            .await?
            .error_for_status()?;

        let body: Value = response.json().await?;
        if let Some(errors) = body.get("errors") {
            if !errors.is_null() {
                return Err(CommerceError::Graphql(errors.to_string()));
            }
        }
        Ok(body.get("data").cloned().unwrap_or(Value::Null))
    }

    /// Collect `userErrors` from a mutation payload into an error.
    fn check_user_errors(payload: &Value) -> Result<(), CommerceError> {
        let errors = payload
            .get("userErrors")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default();
        if errors.is_empty() {
            Ok(())
        } else {
            Err(CommerceError::UserErrors(
                serde_json::to_string(errors).unwrap_or_else(|_| "unknown".into()),
            ))
        }
    }

    /// Create a fulfillment for every OPEN fulfillment order of the
    /// platform order. Returns `None` when nothing is left to fulfill
    /// (the order may already be fulfilled — not an error).
    pub async fn fulfill_order(
        &self,
        shop_domain: &str,
        access_token: &str,
        external_order_id: &str,
    ) -> Result<Option<Fulfillment>, CommerceError> {
        let data = self
            .graphql(
                shop_domain,
                access_token,
                GET_FULFILLMENT_ORDERS_QUERY,
                json!({ "orderId": external_order_id }),
            )
            .await?;

        let order = data.get("order");
        if order.map(Value::is_null).unwrap_or(true) {
            return Err(CommerceError::OrderNotFound(external_order_id.to_string()));
        }

        let open_ids: Vec<String> = order
            .and_then(|o| o.pointer("/fulfillmentOrders/edges"))
            .and_then(Value::as_array)
            .map(|edges| {
                edges
                    .iter()
                    .filter_map(|e| e.get("node"))
                    .filter(|n| n.get("status").and_then(Value::as_str) == Some("OPEN"))
                    .filter_map(|n| n.get("id").and_then(Value::as_str))
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        if open_ids.is_empty() {
            tracing::debug!(
                order = external_order_id,
                "No open fulfillment orders, nothing to fulfill"
            );
            return Ok(None);
        }

        let line_items: Vec<Value> = open_ids
            .iter()
            .map(|id| json!({ "fulfillmentOrderId": id }))
            .collect();

        let data = self
            .graphql(
                shop_domain,
                access_token,
                FULFILL_ORDER_MUTATION,
                json!({
                    "fulfillment": {
                        "lineItemsByFulfillmentOrder": line_items,
                        "notifyCustomer": true,
                    }
                }),
            )
            .await?;

        let payload = data
            .get("fulfillmentCreateV2")
            .cloned()
            .unwrap_or(Value::Null);
        Self::check_user_errors(&payload)?;

        let fulfillment = payload.get("fulfillment").cloned().unwrap_or(Value::Null);
        Ok(Some(Fulfillment {
            id: fulfillment
                .get("id")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            status: fulfillment
                .get("status")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
        }))
    }

    /// Cancel a platform order.
    pub async fn cancel_order(
        &self,
        shop_domain: &str,
        access_token: &str,
        external_order_id: &str,
        options: &CancelOrderOptions,
    ) -> Result<(), CommerceError> {
        let data = self
            .graphql(
                shop_domain,
                access_token,
                CANCEL_ORDER_MUTATION,
                json!({
                    "orderId": external_order_id,
                    "refund": options.refund,
                    "restock": options.restock,
                    "reason": options.reason,
                }),
            )
            .await?;

        Self::check_user_errors(&data.get("orderCancel").cloned().unwrap_or(Value::Null))
    }

    /// Create a refund for one line item of a platform order.
    pub async fn create_refund(
        &self,
        shop_domain: &str,
        access_token: &str,
        external_order_id: &str,
        line_item_id: &str,
        quantity: i32,
        amount: Option<f64>,
    ) -> Result<(), CommerceError> {
        let mut input = json!({
            "orderId": external_order_id,
            "refundLineItems": [{
                "lineItemId": line_item_id,
                "quantity": quantity,
            }],
            "notify": true,
        });
        if let Some(amount) = amount {
            input["shipping"] = json!({ "amount": 0 });
            input["note"] = json!(format!("Refund of {amount:.2} for returned items"));
        }

        let data = self
            .graphql(
                shop_domain,
                access_token,
                CREATE_REFUND_MUTATION,
                json!({ "input": input }),
            )
            .await?;

        Self::check_user_errors(&data.get("refundCreate").cloned().unwrap_or(Value::Null))
    }

    /// Look up an inventory item id by SKU. Returns `None` when the SKU
    /// is unknown to the platform.
    pub async fn find_inventory_item_by_sku(
        &self,
        shop_domain: &str,
        access_token: &str,
        sku: &str,
    ) -> Result<Option<String>, CommerceError> {
        let data = self
            .graphql(
                shop_domain,
                access_token,
                INVENTORY_ITEM_BY_SKU_QUERY,
                json!({ "query": format!("sku:{sku}") }),
            )
            .await?;

        Ok(data
            .pointer("/inventoryItems/edges/0/node/id")
            .and_then(Value::as_str)
            .map(str::to_string))
    }

    /// Set the on-hand quantity of an inventory item at a location.
    pub async fn set_inventory_quantity(
        &self,
        shop_domain: &str,
        access_token: &str,
        inventory_item_id: &str,
        location_id: &str,
        quantity: i32,
    ) -> Result<(), CommerceError> {
        let data = self
            .graphql(
                shop_domain,
                access_token,
                SET_INVENTORY_QUANTITY_MUTATION,
                json!({
                    "input": {
                        "reason": "correction",
                        "setQuantities": [{
                            "inventoryItemId": inventory_item_id,
                            "locationId": location_id,
                            "quantity": quantity,
                        }],
                    }
                }),
            )
            .await?;

        Self::check_user_errors(
            &data
                .get("inventorySetOnHandQuantities")
                .cloned()
                .unwrap_or(Value::Null),
        )
    }
}

impl Default for CommerceClient {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_errors_are_detected() {
        let payload = serde_json::json!({
            "userErrors": [{ "field": "orderId", "message": "invalid" }]
        });
        assert!(CommerceClient::check_user_errors(&payload).is_err());
    }

    #[test]
    fn empty_user_errors_pass() {
        let payload = serde_json::json!({ "userErrors": [] });
        assert!(CommerceClient::check_user_errors(&payload).is_ok());
    }

    #[test]
    fn missing_user_errors_pass() {
        assert!(CommerceClient::check_user_errors(&serde_json::Value::Null).is_ok());
    }
}
