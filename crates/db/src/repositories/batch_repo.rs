//! Repository for the `batches` and `batch_rules` tables.
//!
//! Capacity is the contended resource: every read that precedes a
//! capacity increment takes a row lock (`FOR UPDATE`) so concurrent
//! allocations against the same rule serialize instead of both filling
//! the last slot.

use sqlx::PgConnection;

use presshub_core::status::ProductionStatus;
use presshub_core::types::{DbId, StatusId};

use crate::models::batch::{Batch, CreateBatch};

/// Column list for `batches` queries.
const COLUMNS: &str = "id, name, capacity, max_capacity, status_id, handles_stock, \
    qr_token, qr_url, created_at, updated_at";

/// Prefixed column list for JOIN queries.
const COLUMNS_B: &str = "b.id, b.name, b.capacity, b.max_capacity, b.status_id, \
    b.handles_stock, b.qr_token, b.qr_url, b.created_at, b.updated_at";

/// Provides CRUD and capacity operations for production batches.
pub struct BatchRepo;

impl BatchRepo {
    /// Find a batch by its internal ID.
    pub async fn find_by_id(
        conn: &mut PgConnection,
        id: DbId,
    ) -> Result<Option<Batch>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM batches WHERE id = $1");
        sqlx::query_as::<_, Batch>(&query)
            .bind(id)
            .fetch_optional(conn)
            .await
    }

    /// Find a batch by its internal ID, locking the row for update.
    pub async fn find_by_id_for_update(
        conn: &mut PgConnection,
        id: DbId,
    ) -> Result<Option<Batch>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM batches WHERE id = $1 FOR UPDATE");
        sqlx::query_as::<_, Batch>(&query)
            .bind(id)
            .fetch_optional(conn)
            .await
    }

    /// Find a batch by its scan token.
    pub async fn find_by_token(
        conn: &mut PgConnection,
        token: &str,
    ) -> Result<Option<Batch>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM batches WHERE qr_token = $1");
        sqlx::query_as::<_, Batch>(&query)
            .bind(token)
            .fetch_optional(conn)
            .await
    }

    /// Oldest batch serving `rule_id` with spare capacity and a matching
    /// stock-handling flag. Locks the returned row so the subsequent
    /// capacity increment is serialized against concurrent allocations.
    pub async fn find_available_for_rule(
        conn: &mut PgConnection,
        rule_id: DbId,
        handles_stock: bool,
    ) -> Result<Option<Batch>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS_B} FROM batches b \
             JOIN batch_rules br ON br.batch_id = b.id \
             WHERE br.rule_id = $1 \
               AND b.handles_stock = $2 \
               AND b.capacity < b.max_capacity \
             ORDER BY b.created_at ASC \
             LIMIT 1 \
             FOR UPDATE OF b"
        );
        sqlx::query_as::<_, Batch>(&query)
            .bind(rule_id)
            .bind(handles_stock)
            .fetch_optional(conn)
            .await
    }

    /// Replacement-workflow variant of [`find_available_for_rule`]: the
    /// batch must additionally still be open (PENDING or WAITING_BATCH).
    pub async fn find_open_for_rule(
        conn: &mut PgConnection,
        rule_id: DbId,
    ) -> Result<Option<Batch>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS_B} FROM batches b \
             JOIN batch_rules br ON br.batch_id = b.id \
             WHERE br.rule_id = $1 \
               AND b.capacity < b.max_capacity \
               AND b.status_id IN ($2, $3) \
             ORDER BY b.created_at ASC \
             LIMIT 1 \
             FOR UPDATE OF b"
        );
        sqlx::query_as::<_, Batch>(&query)
            .bind(rule_id)
            .bind(ProductionStatus::Pending.id())
            .bind(ProductionStatus::WaitingBatch.id())
            .fetch_optional(conn)
            .await
    }

    /// Most recently created batch serving `rule_id`, if any. Supplies
    /// the base name, max capacity, and rule set inherited by new batches.
    pub async fn find_last_for_rule(
        conn: &mut PgConnection,
        rule_id: DbId,
    ) -> Result<Option<Batch>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS_B} FROM batches b \
             JOIN batch_rules br ON br.batch_id = b.id \
             WHERE br.rule_id = $1 \
             ORDER BY b.created_at DESC \
             LIMIT 1"
        );
        sqlx::query_as::<_, Batch>(&query)
            .bind(rule_id)
            .fetch_optional(conn)
            .await
    }

    /// Count batches whose name starts with `base_name`, scoped to
    /// batches serving the given store's rules. Drives name suffixing.
    pub async fn count_name_prefix(
        conn: &mut PgConnection,
        store_id: DbId,
        base_name: &str,
    ) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(DISTINCT b.id) FROM batches b \
             JOIN batch_rules br ON br.batch_id = b.id \
             JOIN classification_rules r ON r.id = br.rule_id \
             WHERE r.store_id = $1 AND b.name LIKE $2 || '%'",
        )
        .bind(store_id)
        .bind(base_name)
        .fetch_one(conn)
        .await?;
        Ok(count)
    }

    /// Insert a new empty batch in PENDING status.
    pub async fn create(
        conn: &mut PgConnection,
        input: &CreateBatch,
    ) -> Result<Batch, sqlx::Error> {
        let query = format!(
            "INSERT INTO batches (name, capacity, max_capacity, status_id, handles_stock) \
             VALUES ($1, 0, $2, $3, $4) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Batch>(&query)
            .bind(&input.name)
            .bind(input.max_capacity)
            .bind(ProductionStatus::Pending.id())
            .bind(input.handles_stock)
            .fetch_one(conn)
            .await
    }

    /// Link a batch to a set of classification rules.
    pub async fn link_rules(
        conn: &mut PgConnection,
        batch_id: DbId,
        rule_ids: &[DbId],
    ) -> Result<(), sqlx::Error> {
        for rule_id in rule_ids {
            sqlx::query(
                "INSERT INTO batch_rules (batch_id, rule_id) VALUES ($1, $2) \
                 ON CONFLICT DO NOTHING",
            )
            .bind(batch_id)
            .bind(rule_id)
            .execute(&mut *conn)
            .await?;
        }
        Ok(())
    }

    /// Increment a batch's capacity and return the updated row.
    ///
    /// The `ck_batches_capacity` constraint rejects increments past
    /// `max_capacity` at the database level; callers additionally
    /// re-check the returned row and treat violations as retryable
    /// conflicts.
    pub async fn add_capacity(
        conn: &mut PgConnection,
        batch_id: DbId,
        quantity: i32,
    ) -> Result<Batch, sqlx::Error> {
        let query = format!(
            "UPDATE batches \
             SET capacity = capacity + $2, updated_at = NOW() \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Batch>(&query)
            .bind(batch_id)
            .bind(quantity)
            .fetch_one(conn)
            .await
    }

    /// Write a batch's status.
    pub async fn set_status(
        conn: &mut PgConnection,
        batch_id: DbId,
        status_id: StatusId,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE batches SET status_id = $2, updated_at = NOW() WHERE id = $1")
            .bind(batch_id)
            .bind(status_id)
            .execute(conn)
            .await?;
        Ok(())
    }

    /// Persist a batch's scan token and URL.
    pub async fn set_scan_code(
        conn: &mut PgConnection,
        batch_id: DbId,
        token: &str,
        url: &str,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE batches SET qr_token = $2, qr_url = $3, updated_at = NOW() WHERE id = $1",
        )
        .bind(batch_id)
        .bind(token)
        .bind(url)
        .execute(conn)
        .await?;
        Ok(())
    }

    /// Distinct batches containing units of the given order.
    pub async fn list_for_order(
        conn: &mut PgConnection,
        order_id: DbId,
    ) -> Result<Vec<Batch>, sqlx::Error> {
        let query = format!(
            "SELECT DISTINCT {COLUMNS_B} FROM batches b \
             JOIN batch_items bi ON bi.batch_id = b.id \
             JOIN order_items oi ON oi.id = bi.order_item_id \
             WHERE oi.order_id = $1 \
             ORDER BY b.id"
        );
        sqlx::query_as::<_, Batch>(&query)
            .bind(order_id)
            .fetch_all(conn)
            .await
    }
}
