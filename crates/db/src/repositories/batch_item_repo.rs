//! Repository for the `batch_items` table.

use sqlx::PgConnection;

use presshub_core::status::ProductionStatus;
use presshub_core::types::{DbId, StatusId};

use crate::models::batch_item::BatchItem;

/// Column list for `batch_items` queries.
const COLUMNS: &str = "id, batch_id, order_item_id, quantity, status_id, \
    created_at, updated_at";

/// Provides CRUD operations for batch assignments.
pub struct BatchItemRepo;

impl BatchItemRepo {
    /// Find a batch item by its internal ID.
    pub async fn find_by_id(
        conn: &mut PgConnection,
        id: DbId,
    ) -> Result<Option<BatchItem>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM batch_items WHERE id = $1");
        sqlx::query_as::<_, BatchItem>(&query)
            .bind(id)
            .fetch_optional(conn)
            .await
    }

    /// Whether any batch item exists for the order item. This is the
    /// allocator's idempotency guard against duplicate webhook delivery;
    /// it runs first, inside the allocation transaction.
    pub async fn exists_for_order_item(
        conn: &mut PgConnection,
        order_item_id: DbId,
    ) -> Result<bool, sqlx::Error> {
        let (exists,): (bool,) =
            sqlx::query_as("SELECT EXISTS(SELECT 1 FROM batch_items WHERE order_item_id = $1)")
                .bind(order_item_id)
                .fetch_one(conn)
                .await?;
        Ok(exists)
    }

    /// Find the batch item linking an order item into a specific batch.
    pub async fn find_by_batch_and_order_item(
        conn: &mut PgConnection,
        batch_id: DbId,
        order_item_id: DbId,
    ) -> Result<Option<BatchItem>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM batch_items \
             WHERE batch_id = $1 AND order_item_id = $2"
        );
        sqlx::query_as::<_, BatchItem>(&query)
            .bind(batch_id)
            .bind(order_item_id)
            .fetch_optional(conn)
            .await
    }

    /// Insert a batch item.
    pub async fn create(
        conn: &mut PgConnection,
        batch_id: DbId,
        order_item_id: DbId,
        quantity: i32,
        status: ProductionStatus,
    ) -> Result<BatchItem, sqlx::Error> {
        let query = format!(
            "INSERT INTO batch_items (batch_id, order_item_id, quantity, status_id) \
             VALUES ($1, $2, $3, $4) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, BatchItem>(&query)
            .bind(batch_id)
            .bind(order_item_id)
            .bind(quantity)
            .bind(status.id())
            .fetch_one(conn)
            .await
    }

    /// Increment a batch item's quantity (replacement adds one unit).
    pub async fn add_quantity(
        conn: &mut PgConnection,
        batch_item_id: DbId,
        quantity: i32,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE batch_items SET quantity = quantity + $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(batch_item_id)
        .bind(quantity)
        .execute(conn)
        .await?;
        Ok(())
    }

    /// Write one batch item's status.
    pub async fn set_status(
        conn: &mut PgConnection,
        batch_item_id: DbId,
        status_id: StatusId,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE batch_items SET status_id = $2, updated_at = NOW() WHERE id = $1")
            .bind(batch_item_id)
            .bind(status_id)
            .execute(conn)
            .await?;
        Ok(())
    }

    /// Write the status of every item in a batch (bulk batch transitions).
    pub async fn set_status_for_batch(
        conn: &mut PgConnection,
        batch_id: DbId,
        status_id: StatusId,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE batch_items SET status_id = $2, updated_at = NOW() WHERE batch_id = $1",
        )
        .bind(batch_id)
        .bind(status_id)
        .execute(conn)
        .await?;
        Ok(())
    }

    /// All batch items of one order item, oldest first.
    pub async fn list_for_order_item(
        conn: &mut PgConnection,
        order_item_id: DbId,
    ) -> Result<Vec<BatchItem>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM batch_items \
             WHERE order_item_id = $1 \
             ORDER BY created_at ASC"
        );
        sqlx::query_as::<_, BatchItem>(&query)
            .bind(order_item_id)
            .fetch_all(conn)
            .await
    }

    /// All batch items of one batch.
    pub async fn list_for_batch(
        conn: &mut PgConnection,
        batch_id: DbId,
    ) -> Result<Vec<BatchItem>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM batch_items WHERE batch_id = $1 ORDER BY id"
        );
        sqlx::query_as::<_, BatchItem>(&query)
            .bind(batch_id)
            .fetch_all(conn)
            .await
    }

    /// Statuses of a batch's items belonging to orders OTHER than the
    /// given one. Feeds the cascade's sibling view for batch promotion.
    pub async fn sibling_statuses_for_batch(
        conn: &mut PgConnection,
        batch_id: DbId,
        order_id: DbId,
    ) -> Result<Vec<StatusId>, sqlx::Error> {
        let rows: Vec<(StatusId,)> = sqlx::query_as(
            "SELECT bi.status_id FROM batch_items bi \
             JOIN order_items oi ON oi.id = bi.order_item_id \
             WHERE bi.batch_id = $1 AND oi.order_id <> $2",
        )
        .bind(batch_id)
        .bind(order_id)
        .fetch_all(conn)
        .await?;
        Ok(rows.into_iter().map(|(s,)| s).collect())
    }
}
