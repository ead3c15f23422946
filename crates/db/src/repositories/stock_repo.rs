//! Repository for the `main_stocks`, `main_stock_rules`, and
//! `stock_levels` tables.
//!
//! Stock quantity is decremented both at order-creation time (allocation)
//! and by manual adjustments; both paths go through the same
//! `FOR UPDATE` lookup so concurrent decrements on a SKU serialize.

use sqlx::PgConnection;

use presshub_core::types::DbId;

use crate::models::stock::{MainStock, StockLevel};

/// Column list for `main_stocks` queries.
const STOCK_COLUMNS: &str = "id, name, created_at, updated_at";

/// Column list for `stock_levels` queries.
const LEVEL_COLUMNS: &str = "id, main_stock_id, sku, quantity, created_at, updated_at";

/// Provides stock pool and per-SKU level operations.
pub struct StockRepo;

impl StockRepo {
    /// Find a main stock by its internal ID.
    pub async fn find_by_id(
        conn: &mut PgConnection,
        id: DbId,
    ) -> Result<Option<MainStock>, sqlx::Error> {
        let query = format!("SELECT {STOCK_COLUMNS} FROM main_stocks WHERE id = $1");
        sqlx::query_as::<_, MainStock>(&query)
            .bind(id)
            .fetch_optional(conn)
            .await
    }

    /// Insert a main stock pool.
    pub async fn create(conn: &mut PgConnection, name: &str) -> Result<MainStock, sqlx::Error> {
        let query = format!(
            "INSERT INTO main_stocks (name) VALUES ($1) RETURNING {STOCK_COLUMNS}"
        );
        sqlx::query_as::<_, MainStock>(&query)
            .bind(name)
            .fetch_one(conn)
            .await
    }

    /// Link a main stock to a classification rule.
    pub async fn link_rule(
        conn: &mut PgConnection,
        main_stock_id: DbId,
        rule_id: DbId,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO main_stock_rules (main_stock_id, rule_id) VALUES ($1, $2) \
             ON CONFLICT DO NOTHING",
        )
        .bind(main_stock_id)
        .bind(rule_id)
        .execute(conn)
        .await?;
        Ok(())
    }

    /// Create or overwrite the quantity for a SKU within a main stock.
    pub async fn upsert_level(
        conn: &mut PgConnection,
        main_stock_id: DbId,
        sku: &str,
        quantity: i32,
    ) -> Result<StockLevel, sqlx::Error> {
        let query = format!(
            "INSERT INTO stock_levels (main_stock_id, sku, quantity) \
             VALUES ($1, $2, $3) \
             ON CONFLICT ON CONSTRAINT uq_stock_levels_stock_sku \
             DO UPDATE SET quantity = EXCLUDED.quantity, updated_at = NOW() \
             RETURNING {LEVEL_COLUMNS}"
        );
        sqlx::query_as::<_, StockLevel>(&query)
            .bind(main_stock_id)
            .bind(sku)
            .bind(quantity)
            .fetch_one(conn)
            .await
    }

    /// Resolve the stock level for a SKU through a rule's linked main
    /// stocks, locking the row for the subsequent decrement.
    pub async fn find_level_for_rule_sku(
        conn: &mut PgConnection,
        rule_id: DbId,
        sku: &str,
    ) -> Result<Option<StockLevel>, sqlx::Error> {
        let query = format!(
            "SELECT sl.id, sl.main_stock_id, sl.sku, sl.quantity, \
                    sl.created_at, sl.updated_at \
             FROM stock_levels sl \
             JOIN main_stock_rules msr ON msr.main_stock_id = sl.main_stock_id \
             WHERE msr.rule_id = $1 AND sl.sku = $2 \
             ORDER BY sl.id \
             LIMIT 1 \
             FOR UPDATE OF sl"
        );
        sqlx::query_as::<_, StockLevel>(&query)
            .bind(rule_id)
            .bind(sku)
            .fetch_optional(conn)
            .await
    }

    /// Adjust a stock level by `delta` (negative to decrement) and
    /// return the new quantity. The `ck_stock_levels_quantity` constraint
    /// rejects adjustments below zero.
    pub async fn adjust_level(
        conn: &mut PgConnection,
        level_id: DbId,
        delta: i32,
    ) -> Result<i32, sqlx::Error> {
        let (quantity,): (i32,) = sqlx::query_as(
            "UPDATE stock_levels \
             SET quantity = quantity + $2, updated_at = NOW() \
             WHERE id = $1 \
             RETURNING quantity",
        )
        .bind(level_id)
        .bind(delta)
        .fetch_one(conn)
        .await?;
        Ok(quantity)
    }
}
