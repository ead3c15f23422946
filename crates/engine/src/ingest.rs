//! Order ingestion.
//!
//! Consumes validated order-created events delivered by the commerce
//! platform's webhooks: de-duplicates by external order id, merges
//! duplicate line items, persists the order atomically, then runs the
//! allocator over the new items.

use validator::Validate;

use presshub_core::error::CoreError;
use presshub_core::order_events::{merge_line_items, OrderCreatedEvent};
use presshub_core::types::DbId;
use presshub_db::models::order::{CreateOrder, CreateOrderItem, Order};
use presshub_db::repositories::{OrderItemRepo, OrderRepo, ProductRepo, ProductVariantRepo};

use crate::error::EngineError;
use crate::Engine;

impl Engine {
    /// Ingest one order-created event for a store.
    ///
    /// Returns `None` when the order already exists (at-least-once
    /// delivery). Allocation failures other than a stock shortfall are
    /// logged, not propagated: the order itself is committed and its
    /// items can be re-allocated later.
    pub async fn ingest_order(
        &self,
        store_id: DbId,
        event: &OrderCreatedEvent,
    ) -> Result<Option<Order>, EngineError> {
        event
            .validate()
            .map_err(|e| CoreError::Validation(e.to_string()))?;

        let mut tx = self.pool().begin().await?;

        if OrderRepo::exists_external(&mut *tx, store_id, &event.external_id).await? {
            tracing::warn!(external_id = %event.external_id, "Order already exists, skipping");
            return Ok(None);
        }

        let order = OrderRepo::create(
            &mut *tx,
            &CreateOrder {
                store_id,
                external_id: event.external_id.clone(),
                order_number: event.order_number,
                customer_name: event.customer_name.clone(),
                customer_email: event.customer_email.clone(),
                customer_phone: event.customer_phone.clone(),
                address1: event.address1.clone(),
                address2: event.address2.clone(),
                province: event.province.clone(),
                total_price: event.total_price,
                prepaid: event.prepaid,
            },
        )
        .await?;

        for line in merge_line_items(event.line_items.clone()) {
            let Some(product) =
                ProductRepo::find_by_external(&mut *tx, store_id, &line.product_external_id)
                    .await?
            else {
                tracing::warn!(
                    product = %line.product_external_id,
                    "Product not found, skipping line item"
                );
                continue;
            };

            let variant = match &line.variant_external_id {
                Some(external_id) => {
                    ProductVariantRepo::find_by_external(&mut *tx, product.id, external_id).await?
                }
                None => None,
            };

            OrderItemRepo::create(
                &mut *tx,
                &CreateOrderItem {
                    order_id: order.id,
                    product_id: product.id,
                    variant_id: variant.map(|v| v.id),
                    external_line_id: line.external_id.clone(),
                    quantity: line.quantity,
                    price: line.price,
                },
            )
            .await?;
        }

        tx.commit().await?;
        tracing::info!(order_id = order.id, order_number = order.order_number, "Order ingested");

        // Allocation runs in its own transaction so a stock shortfall
        // rolls back every assignment but keeps the order itself.
        match self.allocate_order(order.id).await {
            Ok(assignments) => {
                tracing::info!(
                    order_id = order.id,
                    batches = assignments.len(),
                    "Items assigned to batches"
                );
            }
            Err(err @ EngineError::InsufficientStock { .. }) => return Err(err),
            Err(err) => {
                tracing::error!(order_id = order.id, error = %err, "Batch assignment failed");
            }
        }

        Ok(Some(order))
    }
}
