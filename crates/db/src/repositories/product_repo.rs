//! Repositories for the `products` and `product_variants` tables.

use sqlx::PgConnection;

use presshub_core::types::DbId;

use crate::models::product::{Product, ProductVariant};

/// Column list for `products` queries.
const PRODUCT_COLUMNS: &str = "id, store_id, external_id, title, product_type, \
    img_url, is_pod, created_at, updated_at";

/// Column list for `product_variants` queries.
const VARIANT_COLUMNS: &str =
    "id, product_id, external_id, sku, title, price, created_at, updated_at";

/// Provides lookups for mirrored products.
pub struct ProductRepo;

impl ProductRepo {
    /// Find a product by its internal ID.
    pub async fn find_by_id(
        conn: &mut PgConnection,
        id: DbId,
    ) -> Result<Option<Product>, sqlx::Error> {
        let query = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1");
        sqlx::query_as::<_, Product>(&query)
            .bind(id)
            .fetch_optional(conn)
            .await
    }

    /// Find a product by its platform gid within a store.
    pub async fn find_by_external(
        conn: &mut PgConnection,
        store_id: DbId,
        external_id: &str,
    ) -> Result<Option<Product>, sqlx::Error> {
        let query = format!(
            "SELECT {PRODUCT_COLUMNS} FROM products \
             WHERE store_id = $1 AND external_id = $2"
        );
        sqlx::query_as::<_, Product>(&query)
            .bind(store_id)
            .bind(external_id)
            .fetch_optional(conn)
            .await
    }

    /// Insert a product. Used by catalog sync and test fixtures.
    pub async fn create(
        conn: &mut PgConnection,
        store_id: DbId,
        external_id: &str,
        title: &str,
        product_type: Option<&str>,
        is_pod: bool,
    ) -> Result<Product, sqlx::Error> {
        let query = format!(
            "INSERT INTO products (store_id, external_id, title, product_type, is_pod) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING {PRODUCT_COLUMNS}"
        );
        sqlx::query_as::<_, Product>(&query)
            .bind(store_id)
            .bind(external_id)
            .bind(title)
            .bind(product_type)
            .bind(is_pod)
            .fetch_one(conn)
            .await
    }
}

/// Provides lookups for mirrored product variants.
pub struct ProductVariantRepo;

impl ProductVariantRepo {
    /// Find a variant by its internal ID.
    pub async fn find_by_id(
        conn: &mut PgConnection,
        id: DbId,
    ) -> Result<Option<ProductVariant>, sqlx::Error> {
        let query = format!("SELECT {VARIANT_COLUMNS} FROM product_variants WHERE id = $1");
        sqlx::query_as::<_, ProductVariant>(&query)
            .bind(id)
            .fetch_optional(conn)
            .await
    }

    /// Find a variant by its platform gid within a product.
    pub async fn find_by_external(
        conn: &mut PgConnection,
        product_id: DbId,
        external_id: &str,
    ) -> Result<Option<ProductVariant>, sqlx::Error> {
        let query = format!(
            "SELECT {VARIANT_COLUMNS} FROM product_variants \
             WHERE product_id = $1 AND external_id = $2"
        );
        sqlx::query_as::<_, ProductVariant>(&query)
            .bind(product_id)
            .bind(external_id)
            .fetch_optional(conn)
            .await
    }

    /// Insert a variant. Used by catalog sync and test fixtures.
    pub async fn create(
        conn: &mut PgConnection,
        product_id: DbId,
        external_id: &str,
        sku: Option<&str>,
        title: Option<&str>,
        price: Option<f64>,
    ) -> Result<ProductVariant, sqlx::Error> {
        let query = format!(
            "INSERT INTO product_variants (product_id, external_id, sku, title, price) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING {VARIANT_COLUMNS}"
        );
        sqlx::query_as::<_, ProductVariant>(&query)
            .bind(product_id)
            .bind(external_id)
            .bind(sku)
            .bind(title)
            .bind(price)
            .fetch_one(conn)
            .await
    }
}
