//! Outbound shipping-carrier client.
//!
//! Books and cancels deliveries on full-order fulfillment for stores that
//! have carrier integration enabled. Like the commerce client, callers in
//! the engine treat every failure as best-effort: logged, never allowed
//! to roll back local state.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::json;

/// Default carrier API base URL.
const DEFAULT_BASE_URL: &str = "https://app.bosta.co/api/v2";

/// HTTP timeout for one carrier request.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

/// Errors from the shipping carrier client.
#[derive(Debug, thiserror::Error)]
pub enum ShippingError {
    /// The underlying HTTP request failed.
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The carrier returned a non-2xx status.
    #[error("Carrier returned HTTP {status}: {body}")]
    Api { status: u16, body: String },

    /// The delivery request is missing receiver phone, address, or city.
    #[error("Cannot book delivery: missing {0}")]
    MissingReceiverDetails(&'static str),
}

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// A delivery booking request. COD amount must already account for
/// prepaid orders (zero when paid by card).
#[derive(Debug, Clone, Serialize)]
pub struct CreateDeliveryRequest {
    pub customer_name: Option<String>,
    pub customer_phone: Option<String>,
    pub customer_email: Option<String>,
    pub address1: Option<String>,
    pub address2: Option<String>,
    pub city: Option<String>,
    pub cod_amount: f64,
    pub items_count: i32,
    /// Order number, echoed back by carrier webhooks.
    pub business_reference: String,
    /// Callback URL for carrier status webhooks.
    pub webhook_url: Option<String>,
}

/// Identifiers of a booked delivery.
#[derive(Debug, Clone, Deserialize)]
pub struct DeliveryHandle {
    pub delivery_id: String,
    pub tracking_number: String,
}

/// Split a full customer name into carrier first/last fields.
fn split_name(full_name: Option<&str>) -> (String, String) {
    let name = full_name.unwrap_or("Customer").trim();
    let name = if name.is_empty() { "Customer" } else { name };
    match name.split_once(' ') {
        Some((first, rest)) => (first.to_string(), rest.trim().to_string()),
        None => (name.to_string(), String::new()),
    }
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Carrier API client. The per-store API key is passed per call.
pub struct ShippingClient {
    http: reqwest::Client,
    base_url: String,
}

impl ShippingClient {
    /// Create a client against the production carrier API.
    pub fn new() -> Self {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    /// Create a client against a custom base URL (tests, staging).
    pub fn with_base_url(base_url: &str) -> Self {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("Failed to build reqwest HTTP client");
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Book a delivery. Validates receiver details client-side before
    /// any network traffic.
    pub async fn create_delivery(
        &self,
        api_key: &str,
        request: &CreateDeliveryRequest,
    ) -> Result<DeliveryHandle, ShippingError> {
        if request.customer_phone.as_deref().unwrap_or("").is_empty() {
            return Err(ShippingError::MissingReceiverDetails("phone"));
        }
        if request.address1.as_deref().unwrap_or("").is_empty() {
            return Err(ShippingError::MissingReceiverDetails("address"));
        }
        if request.city.as_deref().unwrap_or("").is_empty() {
            return Err(ShippingError::MissingReceiverDetails("city"));
        }

        let (first_name, last_name) = split_name(request.customer_name.as_deref());

        let payload = json!({
            "type": "SEND",
            "specs": {
                "packageType": "Parcel",
                "size": "SMALL",
                "packageDetails": { "itemsCount": request.items_count.max(1) },
            },
            "dropOffAddress": {
                "firstLine": request.address1,
                "secondLine": request.address2.clone().unwrap_or_default(),
                "city": request.city,
                "phone": request.customer_phone,
            },
            "receiver": {
                "firstName": first_name,
                "lastName": last_name,
                "phone": request.customer_phone,
                "email": request.customer_email.clone().unwrap_or_default(),
            },
            "cod": request.cod_amount,
            "webhookUrl": request.webhook_url,
            "businessReference": request.business_reference,
        });

        let response = self
            .http
            .post(format!("{}/deliveries", self.base_url))
            .header("Authorization", api_key)
            .json(&payload)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(ShippingError::Api { status, body });
        }

        let body: serde_json::Value = response.json().await?;
        Ok(DeliveryHandle {
            delivery_id: body
                .pointer("/data/_id")
                .and_then(serde_json::Value::as_str)
                .unwrap_or_default()
                .to_string(),
            tracking_number: body
                .pointer("/data/trackingNumber")
                .and_then(serde_json::Value::as_str)
                .unwrap_or_default()
                .to_string(),
        })
    }

    /// Cancel a previously booked delivery.
    pub async fn cancel_delivery(
        &self,
        api_key: &str,
        delivery_id: &str,
    ) -> Result<(), ShippingError> {
        let response = self
            .http
            .delete(format!("{}/deliveries/{delivery_id}", self.base_url))
            .header("Authorization", api_key)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(ShippingError::Api { status, body });
        }
        Ok(())
    }
}

impl Default for ShippingClient {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_name_handles_first_and_last() {
        assert_eq!(
            split_name(Some("Jane Q Doe")),
            ("Jane".to_string(), "Q Doe".to_string())
        );
    }

    #[test]
    fn split_name_defaults_for_missing_or_empty() {
        assert_eq!(split_name(None), ("Customer".to_string(), String::new()));
        assert_eq!(split_name(Some("  ")), ("Customer".to_string(), String::new()));
        assert_eq!(split_name(Some("Cher")), ("Cher".to_string(), String::new()));
    }

    #[tokio::test]
    async fn missing_phone_fails_before_any_request() {
        let client = ShippingClient::with_base_url("http://127.0.0.1:1");
        let request = CreateDeliveryRequest {
            customer_name: Some("Jane Doe".into()),
            customer_phone: None,
            customer_email: None,
            address1: Some("1 Main St".into()),
            address2: None,
            city: Some("Cairo".into()),
            cod_amount: 0.0,
            items_count: 1,
            business_reference: "1001".into(),
            webhook_url: None,
        };
        let err = client.create_delivery("key", &request).await.unwrap_err();
        assert!(matches!(err, ShippingError::MissingReceiverDetails("phone")));
    }
}
