//! Repository for the `order_items` table.

use sqlx::PgConnection;

use presshub_core::types::{DbId, StatusId};

use crate::models::order::{CreateOrderItem, OrderItem};

/// Column list for `order_items` queries.
const COLUMNS: &str = "id, order_id, product_id, variant_id, external_line_id, \
    quantity, price, status_id, created_at, updated_at";

/// Provides CRUD operations for order line items.
pub struct OrderItemRepo;

impl OrderItemRepo {
    /// Find an order item by its internal ID.
    pub async fn find_by_id(
        conn: &mut PgConnection,
        id: DbId,
    ) -> Result<Option<OrderItem>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM order_items WHERE id = $1");
        sqlx::query_as::<_, OrderItem>(&query)
            .bind(id)
            .fetch_optional(conn)
            .await
    }

    /// Insert one line item in WAITING_BATCH status.
    pub async fn create(
        conn: &mut PgConnection,
        input: &CreateOrderItem,
    ) -> Result<OrderItem, sqlx::Error> {
        let query = format!(
            "INSERT INTO order_items \
                 (order_id, product_id, variant_id, external_line_id, quantity, price) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, OrderItem>(&query)
            .bind(input.order_id)
            .bind(input.product_id)
            .bind(input.variant_id)
            .bind(&input.external_line_id)
            .bind(input.quantity)
            .bind(input.price)
            .fetch_one(conn)
            .await
    }

    /// All items of one order.
    pub async fn list_for_order(
        conn: &mut PgConnection,
        order_id: DbId,
    ) -> Result<Vec<OrderItem>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM order_items WHERE order_id = $1 ORDER BY id"
        );
        sqlx::query_as::<_, OrderItem>(&query)
            .bind(order_id)
            .fetch_all(conn)
            .await
    }

    /// Items assigned into one batch, with their owning order ids.
    /// Used by bulk batch transitions to fan out to affected orders.
    pub async fn list_for_batch(
        conn: &mut PgConnection,
        batch_id: DbId,
    ) -> Result<Vec<OrderItem>, sqlx::Error> {
        let query = format!(
            "SELECT DISTINCT oi.id, oi.order_id, oi.product_id, oi.variant_id, \
                    oi.external_line_id, oi.quantity, oi.price, oi.status_id, \
                    oi.created_at, oi.updated_at \
             FROM order_items oi \
             JOIN batch_items bi ON bi.order_item_id = oi.id \
             WHERE bi.batch_id = $1 \
             ORDER BY oi.id"
        );
        sqlx::query_as::<_, OrderItem>(&query)
            .bind(batch_id)
            .fetch_all(conn)
            .await
    }

    /// Write one item's status.
    pub async fn set_status(
        conn: &mut PgConnection,
        order_item_id: DbId,
        status_id: StatusId,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE order_items SET status_id = $2, updated_at = NOW() WHERE id = $1")
            .bind(order_item_id)
            .bind(status_id)
            .execute(conn)
            .await?;
        Ok(())
    }

    /// Write the status of every item assigned into a batch.
    pub async fn set_status_for_batch(
        conn: &mut PgConnection,
        batch_id: DbId,
        status_id: StatusId,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE order_items oi \
             SET status_id = $2, updated_at = NOW() \
             FROM batch_items bi \
             WHERE bi.order_item_id = oi.id AND bi.batch_id = $1",
        )
        .bind(batch_id)
        .bind(status_id)
        .execute(conn)
        .await?;
        Ok(())
    }
}
