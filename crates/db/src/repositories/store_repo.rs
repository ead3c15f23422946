//! Repository for the `stores` table.

use sqlx::PgConnection;

use presshub_core::types::DbId;

use crate::models::store::Store;

/// Column list for `stores` queries.
const COLUMNS: &str = "id, name, shop_domain, access_token, carrier_api_key, \
    carrier_enabled, created_at, updated_at";

/// Provides lookups for connected stores.
pub struct StoreRepo;

impl StoreRepo {
    /// Find a store by its internal ID.
    pub async fn find_by_id(
        conn: &mut PgConnection,
        id: DbId,
    ) -> Result<Option<Store>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM stores WHERE id = $1");
        sqlx::query_as::<_, Store>(&query)
            .bind(id)
            .fetch_optional(conn)
            .await
    }

    /// Find a store by its shop domain (webhook routing key).
    pub async fn find_by_domain(
        conn: &mut PgConnection,
        shop_domain: &str,
    ) -> Result<Option<Store>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM stores WHERE shop_domain = $1");
        sqlx::query_as::<_, Store>(&query)
            .bind(shop_domain)
            .fetch_optional(conn)
            .await
    }

    /// Insert a store. Used by onboarding and test fixtures.
    pub async fn create(
        conn: &mut PgConnection,
        name: &str,
        shop_domain: &str,
    ) -> Result<Store, sqlx::Error> {
        let query = format!(
            "INSERT INTO stores (name, shop_domain) VALUES ($1, $2) RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Store>(&query)
            .bind(name)
            .bind(shop_domain)
            .fetch_one(conn)
            .await
    }

    /// Enable carrier booking for a store, storing its API key.
    pub async fn set_carrier_config(
        conn: &mut PgConnection,
        store_id: DbId,
        carrier_api_key: Option<&str>,
        carrier_enabled: bool,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE stores \
             SET carrier_api_key = $2, carrier_enabled = $3, updated_at = NOW() \
             WHERE id = $1",
        )
        .bind(store_id)
        .bind(carrier_api_key)
        .bind(carrier_enabled)
        .execute(conn)
        .await?;
        Ok(())
    }
}
