//! Post-commit platform synchronization.
//!
//! Terminal order transitions produce side-effect descriptors inside the
//! triggering transaction; this module executes them AFTER the local
//! commit, best-effort. Failures here are eventual-consistency debt:
//! logged, never propagated, never rolled back into local state.

use presshub_commerce::{CancelOrderOptions, CommerceClient, CommerceError};
use presshub_core::error::CoreError;
use presshub_core::types::DbId;
use presshub_db::models::order::Order;
use presshub_db::models::store::Store;
use presshub_db::repositories::{OrderItemRepo, OrderRepo, StoreRepo};
use presshub_db::DbPool;
use presshub_shipping::{CreateDeliveryRequest, DeliveryHandle, ShippingClient, ShippingError};

/// An outbound platform call owed after a committed local transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlatformSideEffect {
    /// Order fully fulfilled: create the platform fulfillment and book a
    /// carrier delivery for carrier-enabled stores.
    Fulfill { order_id: DbId },
    /// Order fully cancelled: cancel the platform order and any booked
    /// delivery.
    Cancel { order_id: DbId },
    /// Order fully returned: create refunds per returned line item.
    Refund { order_id: DbId },
}

/// Internal error type: everything here is caught and logged.
#[derive(Debug, thiserror::Error)]
enum SyncError {
    #[error(transparent)]
    Commerce(#[from] CommerceError),
    #[error(transparent)]
    Shipping(#[from] ShippingError),
    #[error("Database error: {0}")]
    Db(#[from] sqlx::Error),
    #[error(transparent)]
    Core(#[from] CoreError),
}

/// Executes platform side effects against the commerce and shipping
/// collaborators.
pub struct PlatformSync {
    commerce: CommerceClient,
    shipping: ShippingClient,
    webhook_url: Option<String>,
}

impl PlatformSync {
    pub fn new(
        commerce: CommerceClient,
        shipping: ShippingClient,
        webhook_url: Option<String>,
    ) -> Self {
        Self {
            commerce,
            shipping,
            webhook_url,
        }
    }

    /// Run every side effect, logging failures without propagating them.
    pub async fn run(&self, pool: &DbPool, effects: &[PlatformSideEffect]) {
        for effect in effects {
            if let Err(err) = self.run_one(pool, effect).await {
                tracing::error!(?effect, error = %err, "Platform sync failed; local state kept");
            }
        }
    }

    async fn run_one(&self, pool: &DbPool, effect: &PlatformSideEffect) -> Result<(), SyncError> {
        let order_id = match effect {
            PlatformSideEffect::Fulfill { order_id }
            | PlatformSideEffect::Cancel { order_id }
            | PlatformSideEffect::Refund { order_id } => *order_id,
        };

        let mut conn = pool.acquire().await?;
        let order = OrderRepo::find_by_id(&mut conn, order_id)
            .await?
            .ok_or(CoreError::NotFound {
                entity: "Order",
                id: order_id,
            })?;
        let store = StoreRepo::find_by_id(&mut conn, order.store_id)
            .await?
            .ok_or(CoreError::NotFound {
                entity: "Store",
                id: order.store_id,
            })?;
        drop(conn);

        match effect {
            PlatformSideEffect::Fulfill { .. } => self.fulfill(pool, &store, &order).await,
            PlatformSideEffect::Cancel { .. } => self.cancel(&store, &order).await,
            PlatformSideEffect::Refund { .. } => self.refund(pool, &store, &order).await,
        }
    }

    /// Create the platform fulfillment, then book the carrier delivery
    /// for carrier-enabled stores. A carrier failure after a successful
    /// fulfillment is logged independently.
    async fn fulfill(&self, pool: &DbPool, store: &Store, order: &Order) -> Result<(), SyncError> {
        let Some(access_token) = store.access_token.as_deref() else {
            tracing::warn!(store = %store.name, "Store has no access token, skipping fulfillment");
            return Ok(());
        };

        self.commerce
            .fulfill_order(&store.shop_domain, access_token, &order.external_id)
            .await?;
        tracing::info!(order_number = order.order_number, "Platform fulfillment created");

        if store.carrier_enabled {
            match self.book_delivery(store, order).await {
                Ok(Some(handle)) => {
                    let mut conn = pool.acquire().await?;
                    OrderRepo::set_carrier_refs(
                        &mut conn,
                        order.id,
                        &handle.delivery_id,
                        &handle.tracking_number,
                    )
                    .await?;
                    tracing::info!(
                        order_number = order.order_number,
                        tracking = %handle.tracking_number,
                        "Carrier delivery booked"
                    );
                }
                Ok(None) => {}
                Err(err) => {
                    tracing::error!(
                        order_number = order.order_number,
                        error = %err,
                        "Carrier booking failed"
                    );
                }
            }
        }
        Ok(())
    }

    async fn book_delivery(
        &self,
        store: &Store,
        order: &Order,
    ) -> Result<Option<DeliveryHandle>, ShippingError> {
        let Some(api_key) = store.carrier_api_key.as_deref() else {
            tracing::warn!(store = %store.name, "Carrier enabled but no API key configured");
            return Ok(None);
        };

        // COD only for non-prepaid orders.
        let cod_amount = if order.prepaid {
            0.0
        } else {
            order.total_price.unwrap_or(0.0)
        };

        let request = CreateDeliveryRequest {
            customer_name: order.customer_name.clone(),
            customer_phone: order.customer_phone.clone(),
            customer_email: order.customer_email.clone(),
            address1: order.address1.clone(),
            address2: order.address2.clone(),
            city: order.province.clone(),
            cod_amount,
            items_count: 1,
            business_reference: order.order_number.to_string(),
            webhook_url: self.webhook_url.clone(),
        };

        self.shipping
            .create_delivery(api_key, &request)
            .await
            .map(Some)
    }

    /// Cancel the platform order (refund + restock) and any booked
    /// carrier delivery.
    async fn cancel(&self, store: &Store, order: &Order) -> Result<(), SyncError> {
        if let Some(access_token) = store.access_token.as_deref() {
            self.commerce
                .cancel_order(
                    &store.shop_domain,
                    access_token,
                    &order.external_id,
                    &CancelOrderOptions::default(),
                )
                .await?;
            tracing::info!(order_number = order.order_number, "Platform order cancelled");
        }

        if let (Some(api_key), Some(delivery_id)) = (
            store.carrier_api_key.as_deref(),
            order.carrier_delivery_id.as_deref(),
        ) {
            if let Err(err) = self.shipping.cancel_delivery(api_key, delivery_id).await {
                tracing::error!(
                    order_number = order.order_number,
                    error = %err,
                    "Carrier cancellation failed"
                );
            }
        }
        Ok(())
    }

    /// Create one refund per returned line item.
    async fn refund(&self, pool: &DbPool, store: &Store, order: &Order) -> Result<(), SyncError> {
        let Some(access_token) = store.access_token.as_deref() else {
            tracing::warn!(store = %store.name, "Store has no access token, skipping refunds");
            return Ok(());
        };

        let mut conn = pool.acquire().await?;
        let items = OrderItemRepo::list_for_order(&mut conn, order.id).await?;
        drop(conn);

        for item in items {
            let Some(line_id) = item.external_line_id.as_deref() else {
                tracing::warn!(
                    order_item_id = item.id,
                    "No platform line id, cannot refund this line"
                );
                continue;
            };
            let amount = item.price.map(|p| p * f64::from(item.quantity));
            self.commerce
                .create_refund(
                    &store.shop_domain,
                    access_token,
                    &order.external_id,
                    line_id,
                    item.quantity,
                    amount,
                )
                .await?;
            tracing::info!(
                order_number = order.order_number,
                order_item_id = item.id,
                "Refund created for returned line"
            );
        }
        Ok(())
    }
}
