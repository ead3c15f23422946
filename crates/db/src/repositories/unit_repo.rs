//! Repository for the `batch_item_units` table.

use sqlx::PgConnection;

use presshub_core::status::ProductionStatus;
use presshub_core::types::{DbId, StatusId};

use crate::models::unit::BatchItemUnit;

/// Column list for `batch_item_units` queries.
const COLUMNS: &str = "id, batch_item_id, status_id, qr_token, qr_url, \
    created_at, updated_at";

/// Provides CRUD operations for physical production units.
pub struct UnitRepo;

impl UnitRepo {
    /// Find a unit by its internal ID.
    pub async fn find_by_id(
        conn: &mut PgConnection,
        id: DbId,
    ) -> Result<Option<BatchItemUnit>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM batch_item_units WHERE id = $1");
        sqlx::query_as::<_, BatchItemUnit>(&query)
            .bind(id)
            .fetch_optional(conn)
            .await
    }

    /// Find a unit by its scan token.
    pub async fn find_by_token(
        conn: &mut PgConnection,
        token: &str,
    ) -> Result<Option<BatchItemUnit>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM batch_item_units WHERE qr_token = $1");
        sqlx::query_as::<_, BatchItemUnit>(&query)
            .bind(token)
            .fetch_optional(conn)
            .await
    }

    /// Insert `count` units for a batch item, all in the given status.
    pub async fn insert_many(
        conn: &mut PgConnection,
        batch_item_id: DbId,
        count: i32,
        status: ProductionStatus,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO batch_item_units (batch_item_id, status_id) \
             SELECT $1, $2 FROM generate_series(1, $3)",
        )
        .bind(batch_item_id)
        .bind(status.id())
        .bind(count)
        .execute(conn)
        .await?;
        Ok(())
    }

    /// Insert one unit with a scan token (replacement workflow).
    pub async fn insert_one(
        conn: &mut PgConnection,
        batch_item_id: DbId,
        status: ProductionStatus,
        qr_token: Option<&str>,
        qr_url: Option<&str>,
    ) -> Result<BatchItemUnit, sqlx::Error> {
        let query = format!(
            "INSERT INTO batch_item_units (batch_item_id, status_id, qr_token, qr_url) \
             VALUES ($1, $2, $3, $4) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, BatchItemUnit>(&query)
            .bind(batch_item_id)
            .bind(status.id())
            .bind(qr_token)
            .bind(qr_url)
            .fetch_one(conn)
            .await
    }

    /// Write one unit's status.
    pub async fn set_status(
        conn: &mut PgConnection,
        unit_id: DbId,
        status_id: StatusId,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE batch_item_units SET status_id = $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(unit_id)
        .bind(status_id)
        .execute(conn)
        .await?;
        Ok(())
    }

    /// Write the status of every non-cancelled unit in a batch (bulk
    /// batch transitions; cancelled units stay cancelled).
    pub async fn set_status_for_batch(
        conn: &mut PgConnection,
        batch_id: DbId,
        status_id: StatusId,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE batch_item_units u \
             SET status_id = $2, updated_at = NOW() \
             FROM batch_items bi \
             WHERE bi.id = u.batch_item_id \
               AND bi.batch_id = $1 \
               AND u.status_id <> $3",
        )
        .bind(batch_id)
        .bind(status_id)
        .bind(ProductionStatus::Cancelled.id())
        .execute(conn)
        .await?;
        Ok(())
    }

    /// Write the status of every non-cancelled unit under one order item.
    pub async fn set_status_for_order_item(
        conn: &mut PgConnection,
        order_item_id: DbId,
        status_id: StatusId,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE batch_item_units u \
             SET status_id = $2, updated_at = NOW() \
             FROM batch_items bi \
             WHERE bi.id = u.batch_item_id \
               AND bi.order_item_id = $1 \
               AND u.status_id <> $3",
        )
        .bind(order_item_id)
        .bind(status_id)
        .bind(ProductionStatus::Cancelled.id())
        .execute(conn)
        .await?;
        Ok(())
    }

    /// All units of one batch item, oldest first.
    pub async fn list_for_batch_item(
        conn: &mut PgConnection,
        batch_item_id: DbId,
    ) -> Result<Vec<BatchItemUnit>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM batch_item_units WHERE batch_item_id = $1 ORDER BY id"
        );
        sqlx::query_as::<_, BatchItemUnit>(&query)
            .bind(batch_item_id)
            .fetch_all(conn)
            .await
    }

    /// Statuses of every unit in one batch item.
    pub async fn statuses_for_batch_item(
        conn: &mut PgConnection,
        batch_item_id: DbId,
    ) -> Result<Vec<StatusId>, sqlx::Error> {
        let rows: Vec<(StatusId,)> = sqlx::query_as(
            "SELECT status_id FROM batch_item_units WHERE batch_item_id = $1 ORDER BY id",
        )
        .bind(batch_item_id)
        .fetch_all(conn)
        .await?;
        Ok(rows.into_iter().map(|(s,)| s).collect())
    }

    /// Statuses of every unit under one order item (all its batch items).
    pub async fn statuses_for_order_item(
        conn: &mut PgConnection,
        order_item_id: DbId,
    ) -> Result<Vec<StatusId>, sqlx::Error> {
        let rows: Vec<(StatusId,)> = sqlx::query_as(
            "SELECT u.status_id FROM batch_item_units u \
             JOIN batch_items bi ON bi.id = u.batch_item_id \
             WHERE bi.order_item_id = $1 \
             ORDER BY u.id",
        )
        .bind(order_item_id)
        .fetch_all(conn)
        .await?;
        Ok(rows.into_iter().map(|(s,)| s).collect())
    }

    /// Units of a batch that have no scan token yet (label generation).
    pub async fn list_without_token_for_batch(
        conn: &mut PgConnection,
        batch_id: DbId,
    ) -> Result<Vec<BatchItemUnit>, sqlx::Error> {
        let query = format!(
            "SELECT u.id, u.batch_item_id, u.status_id, u.qr_token, u.qr_url, \
                    u.created_at, u.updated_at \
             FROM batch_item_units u \
             JOIN batch_items bi ON bi.id = u.batch_item_id \
             WHERE bi.batch_id = $1 AND u.qr_token IS NULL \
             ORDER BY u.id"
        );
        sqlx::query_as::<_, BatchItemUnit>(&query)
            .bind(batch_id)
            .fetch_all(conn)
            .await
    }

    /// Persist a unit's scan token and URL.
    pub async fn set_scan_code(
        conn: &mut PgConnection,
        unit_id: DbId,
        token: &str,
        url: &str,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE batch_item_units \
             SET qr_token = $2, qr_url = $3, updated_at = NOW() \
             WHERE id = $1",
        )
        .bind(unit_id)
        .bind(token)
        .bind(url)
        .execute(conn)
        .await?;
        Ok(())
    }
}
