//! Repository for the `orders` table.

use sqlx::PgConnection;

use presshub_core::types::{DbId, StatusId};

use crate::models::order::{CreateOrder, Order};

/// Column list for `orders` queries.
const COLUMNS: &str = "id, store_id, external_id, order_number, customer_name, \
    customer_email, customer_phone, address1, address2, province, total_price, \
    prepaid, status_id, carrier_delivery_id, tracking_number, created_at, updated_at";

/// Provides CRUD operations for customer orders.
pub struct OrderRepo;

impl OrderRepo {
    /// Find an order by its internal ID.
    pub async fn find_by_id(
        conn: &mut PgConnection,
        id: DbId,
    ) -> Result<Option<Order>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM orders WHERE id = $1");
        sqlx::query_as::<_, Order>(&query)
            .bind(id)
            .fetch_optional(conn)
            .await
    }

    /// Whether an order with this platform id already exists for the
    /// store. Webhook delivery is at-least-once; this is the ingestion
    /// de-duplication check.
    pub async fn exists_external(
        conn: &mut PgConnection,
        store_id: DbId,
        external_id: &str,
    ) -> Result<bool, sqlx::Error> {
        let (exists,): (bool,) = sqlx::query_as(
            "SELECT EXISTS(SELECT 1 FROM orders WHERE store_id = $1 AND external_id = $2)",
        )
        .bind(store_id)
        .bind(external_id)
        .fetch_one(conn)
        .await?;
        Ok(exists)
    }

    /// Insert a new order in PENDING status.
    pub async fn create(
        conn: &mut PgConnection,
        input: &CreateOrder,
    ) -> Result<Order, sqlx::Error> {
        let query = format!(
            "INSERT INTO orders \
                 (store_id, external_id, order_number, customer_name, customer_email, \
                  customer_phone, address1, address2, province, total_price, prepaid) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Order>(&query)
            .bind(input.store_id)
            .bind(&input.external_id)
            .bind(input.order_number)
            .bind(&input.customer_name)
            .bind(&input.customer_email)
            .bind(&input.customer_phone)
            .bind(&input.address1)
            .bind(&input.address2)
            .bind(&input.province)
            .bind(input.total_price)
            .bind(input.prepaid)
            .fetch_one(conn)
            .await
    }

    /// Write an order's status.
    pub async fn set_status(
        conn: &mut PgConnection,
        order_id: DbId,
        status_id: StatusId,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE orders SET status_id = $2, updated_at = NOW() WHERE id = $1")
            .bind(order_id)
            .bind(status_id)
            .execute(conn)
            .await?;
        Ok(())
    }

    /// Record the carrier booking on the order after a successful
    /// delivery creation.
    pub async fn set_carrier_refs(
        conn: &mut PgConnection,
        order_id: DbId,
        delivery_id: &str,
        tracking_number: &str,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE orders \
             SET carrier_delivery_id = $2, tracking_number = $3, updated_at = NOW() \
             WHERE id = $1",
        )
        .bind(order_id)
        .bind(delivery_id)
        .bind(tracking_number)
        .execute(conn)
        .await?;
        Ok(())
    }
}
