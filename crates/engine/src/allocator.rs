//! Batch capacity allocator.
//!
//! Places an order's line items into capacity-bounded batches grouped by
//! classification rule, splitting items across batches when a single
//! batch cannot hold the full quantity. One transaction covers the whole
//! order: a stock shortfall on any item rolls back every assignment.

use sqlx::PgConnection;

use presshub_core::error::CoreError;
use presshub_core::naming::{base_name_of, compose_base_name, unique_batch_name};
use presshub_core::status::ProductionStatus;
use presshub_core::types::DbId;
use presshub_db::models::batch::{Batch, CreateBatch};
use presshub_db::models::order::OrderItem;
use presshub_db::models::product::ProductVariant;
use presshub_db::models::rule::ClassificationRule;
use presshub_db::repositories::{
    BatchItemRepo, BatchRepo, ClassificationRuleRepo, OrderItemRepo, OrderRepo, ProductRepo,
    ProductVariantRepo, StockRepo, UnitRepo,
};

use crate::cascade;
use crate::codes::ScanCodeConfig;
use crate::error::EngineError;
use crate::{autostatus, Engine};

/// Max capacity for the first batch of a rule, when no precedent exists.
pub const DEFAULT_MAX_CAPACITY: i32 = 10;

/// One batch assignment produced by the allocator.
#[derive(Debug, Clone)]
pub struct Assignment {
    pub batch_id: DbId,
    pub batch_name: String,
    pub quantity: i32,
}

impl Engine {
    /// Assign every unbatched item of an order into batches.
    ///
    /// Idempotent per item: items that already have a batch assignment
    /// are skipped, so at-least-once webhook delivery cannot duplicate
    /// units. All-or-nothing: an [`EngineError::InsufficientStock`] on
    /// any item rolls the whole order's assignment back.
    pub async fn allocate_order(&self, order_id: DbId) -> Result<Vec<Assignment>, EngineError> {
        let mut tx = self.pool().begin().await?;

        let order = OrderRepo::find_by_id(&mut *tx, order_id)
            .await?
            .ok_or(CoreError::NotFound {
                entity: "Order",
                id: order_id,
            })?;
        let items = OrderItemRepo::list_for_order(&mut *tx, order_id).await?;

        let mut assignments = Vec::new();
        for item in &items {
            assignments
                .extend(allocate_item(&mut *tx, order.store_id, order.id, item, self.codes()).await?);
        }

        tx.commit().await?;
        Ok(assignments)
    }
}

/// Assign one order item, looping until its full quantity is placed.
async fn allocate_item(
    conn: &mut PgConnection,
    store_id: DbId,
    order_id: DbId,
    item: &OrderItem,
    codes: &ScanCodeConfig,
) -> Result<Vec<Assignment>, EngineError> {
    // Idempotency guard first, inside the transaction: duplicate webhook
    // deliveries race on this check and the second one must see the
    // first one's rows.
    if BatchItemRepo::exists_for_order_item(&mut *conn, item.id).await? {
        tracing::warn!(order_item_id = item.id, "Item already batched, skipping");
        return Ok(Vec::new());
    }

    let Some(product) = ProductRepo::find_by_id(&mut *conn, item.product_id).await? else {
        tracing::warn!(order_item_id = item.id, "Product missing, skipping");
        return Ok(Vec::new());
    };
    let Some(type_name) = product.product_type.as_deref() else {
        return Ok(Vec::new());
    };

    let variant = match item.variant_id {
        Some(variant_id) => ProductVariantRepo::find_by_id(&mut *conn, variant_id).await?,
        None => None,
    };
    let variant_title = variant.as_ref().and_then(|v| v.title.as_deref());

    let Some(rule) =
        ClassificationRuleRepo::find_match(&mut *conn, store_id, type_name, variant_title).await?
    else {
        tracing::warn!(
            product_type = type_name,
            variant_title,
            "No classification rule, skipping item"
        );
        return Ok(Vec::new());
    };

    if !rule.is_batchable() {
        tracing::info!(
            order_item_id = item.id,
            rule_id = rule.id,
            "Rule is neither POD nor stock-handling, skipping item"
        );
        return Ok(Vec::new());
    }
    let needs_stock = rule.requires_stock;

    let mut remaining = item.quantity;
    let mut assignments = Vec::new();

    while remaining > 0 {
        // Oldest-first fill; the row comes back locked so the capacity
        // increment below is serialized against concurrent allocations.
        let batch =
            match BatchRepo::find_available_for_rule(&mut *conn, rule.id, needs_stock).await? {
                Some(batch) => batch,
                None => {
                    create_batch_for_rule(&mut *conn, store_id, &rule, variant_title, needs_stock)
                        .await?
                }
            };

        let quantity = remaining.min(batch.remaining_capacity());

        let batch_item =
            BatchItemRepo::create(&mut *conn, batch.id, item.id, quantity, ProductionStatus::WaitingBatch)
                .await?;
        UnitRepo::insert_many(&mut *conn, batch_item.id, quantity, ProductionStatus::WaitingBatch)
            .await?;

        let updated = BatchRepo::add_capacity(&mut *conn, batch.id, quantity)
            .await
            .map_err(|e| EngineError::from_capacity_increment(e, batch.id))?;
        if updated.capacity > updated.max_capacity {
            return Err(EngineError::CapacityConflict { batch_id: batch.id });
        }

        OrderItemRepo::set_status(&mut *conn, item.id, ProductionStatus::WaitingBatch.id())
            .await?;

        if needs_stock {
            decrement_stock(&mut *conn, &rule, variant.as_ref(), quantity).await?;
        }

        cascade::propagate(&mut *conn, order_id).await?;
        autostatus::auto_promote_within(&mut *conn, batch.id, codes).await?;

        tracing::info!(
            order_item_id = item.id,
            batch = %batch.name,
            quantity,
            remaining = remaining - quantity,
            "Assigned item units to batch"
        );

        assignments.push(Assignment {
            batch_id: batch.id,
            batch_name: batch.name.clone(),
            quantity,
        });
        remaining -= quantity;
    }

    Ok(assignments)
}

/// Create a new batch for a rule, inheriting naming, max capacity, and
/// the full rule set from the rule's most recent batch when one exists.
pub(crate) async fn create_batch_for_rule(
    conn: &mut PgConnection,
    store_id: DbId,
    rule: &ClassificationRule,
    variant_title: Option<&str>,
    handles_stock: bool,
) -> Result<Batch, EngineError> {
    let last = BatchRepo::find_last_for_rule(&mut *conn, rule.id).await?;

    let base_name = match &last {
        Some(batch) => base_name_of(&batch.name).to_string(),
        None => compose_base_name(&rule.name, variant_title),
    };
    let existing = BatchRepo::count_name_prefix(&mut *conn, store_id, &base_name).await?;
    let name = unique_batch_name(&base_name, existing);

    let max_capacity = last
        .as_ref()
        .map(|batch| batch.max_capacity)
        .unwrap_or(DEFAULT_MAX_CAPACITY);

    // Continuity: a successor batch serves everything its predecessor
    // served, not just the rule that happened to trigger creation.
    let rule_ids: Vec<DbId> = match &last {
        Some(batch) => {
            let rules = ClassificationRuleRepo::list_for_batch(&mut *conn, batch.id).await?;
            if rules.is_empty() {
                vec![rule.id]
            } else {
                rules.iter().map(|r| r.id).collect()
            }
        }
        None => vec![rule.id],
    };

    let batch = BatchRepo::create(
        &mut *conn,
        &CreateBatch {
            name,
            max_capacity,
            handles_stock,
        },
    )
    .await?;
    BatchRepo::link_rules(&mut *conn, batch.id, &rule_ids).await?;

    tracing::info!(batch = %batch.name, rules = ?rule_ids, "Created new batch");
    Ok(batch)
}

/// Decrement the stock level backing a stock-handling assignment.
///
/// A missing SKU or stock record is tolerated with a warning (the rule
/// may be newly configured); an insufficient quantity aborts the whole
/// allocation transaction.
async fn decrement_stock(
    conn: &mut PgConnection,
    rule: &ClassificationRule,
    variant: Option<&ProductVariant>,
    quantity: i32,
) -> Result<(), EngineError> {
    let Some(sku) = variant.and_then(|v| v.sku.as_deref()) else {
        tracing::warn!(rule_id = rule.id, "Stock-handling item has no SKU, skipping decrement");
        return Ok(());
    };

    match StockRepo::find_level_for_rule_sku(&mut *conn, rule.id, sku).await? {
        None => {
            tracing::warn!(rule_id = rule.id, sku, "No stock record for SKU, skipping decrement");
            Ok(())
        }
        Some(level) => {
            if level.quantity < quantity {
                return Err(EngineError::InsufficientStock {
                    sku: sku.to_string(),
                    have: level.quantity,
                    need: quantity,
                });
            }
            StockRepo::adjust_level(&mut *conn, level.id, -quantity).await?;
            tracing::info!(sku, quantity, "Decremented stock");
            Ok(())
        }
    }
}
