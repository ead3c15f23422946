//! Repository for the `classification_rules` table.

use sqlx::PgConnection;

use presshub_core::types::DbId;

use crate::models::rule::ClassificationRule;

/// Column list for `classification_rules` queries.
const COLUMNS: &str = "id, store_id, name, variant_title, is_pod, requires_stock, \
    created_at, updated_at";

/// Provides lookups for classification rules.
pub struct ClassificationRuleRepo;

impl ClassificationRuleRepo {
    /// Find a rule by its internal ID.
    pub async fn find_by_id(
        conn: &mut PgConnection,
        id: DbId,
    ) -> Result<Option<ClassificationRule>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM classification_rules WHERE id = $1");
        sqlx::query_as::<_, ClassificationRule>(&query)
            .bind(id)
            .fetch_optional(conn)
            .await
    }

    /// Resolve the rule for a product type and variant title.
    ///
    /// Type names match case-insensitively. A rule with the exact variant
    /// title is preferred; a rule with `variant_title IS NULL` is the
    /// generic fallback.
    pub async fn find_match(
        conn: &mut PgConnection,
        store_id: DbId,
        type_name: &str,
        variant_title: Option<&str>,
    ) -> Result<Option<ClassificationRule>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM classification_rules \
             WHERE store_id = $1 \
               AND LOWER(name) = LOWER($2) \
               AND (variant_title = $3 OR variant_title IS NULL) \
             ORDER BY variant_title NULLS LAST \
             LIMIT 1"
        );
        sqlx::query_as::<_, ClassificationRule>(&query)
            .bind(store_id)
            .bind(type_name)
            .bind(variant_title)
            .fetch_optional(conn)
            .await
    }

    /// Resolve the POD rule for a product type (replacement workflow).
    pub async fn find_pod_rule(
        conn: &mut PgConnection,
        store_id: DbId,
        type_name: &str,
    ) -> Result<Option<ClassificationRule>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM classification_rules \
             WHERE store_id = $1 AND LOWER(name) = LOWER($2) AND is_pod = TRUE \
             ORDER BY variant_title NULLS LAST \
             LIMIT 1"
        );
        sqlx::query_as::<_, ClassificationRule>(&query)
            .bind(store_id)
            .bind(type_name)
            .fetch_optional(conn)
            .await
    }

    /// Rules linked to a batch, oldest link first.
    pub async fn list_for_batch(
        conn: &mut PgConnection,
        batch_id: DbId,
    ) -> Result<Vec<ClassificationRule>, sqlx::Error> {
        let query = format!(
            "SELECT r.id, r.store_id, r.name, r.variant_title, r.is_pod, \
                    r.requires_stock, r.created_at, r.updated_at \
             FROM classification_rules r \
             JOIN batch_rules br ON br.rule_id = r.id \
             WHERE br.batch_id = $1 \
             ORDER BY r.id"
        );
        sqlx::query_as::<_, ClassificationRule>(&query)
            .bind(batch_id)
            .fetch_all(conn)
            .await
    }

    /// Insert a rule. Used by rule administration and test fixtures.
    pub async fn create(
        conn: &mut PgConnection,
        store_id: DbId,
        name: &str,
        variant_title: Option<&str>,
        is_pod: bool,
        requires_stock: bool,
    ) -> Result<ClassificationRule, sqlx::Error> {
        let query = format!(
            "INSERT INTO classification_rules \
                 (store_id, name, variant_title, is_pod, requires_stock) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ClassificationRule>(&query)
            .bind(store_id)
            .bind(name)
            .bind(variant_title)
            .bind(is_pod)
            .bind(requires_stock)
            .fetch_one(conn)
            .await
    }
}
