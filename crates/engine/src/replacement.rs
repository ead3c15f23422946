//! Replacement workflow.
//!
//! When a unit is found defective on the floor, it is cancelled (never
//! deleted — the audit trail survives) and a fresh unit is created in an
//! open batch, possibly a brand new one. The whole exchange is one
//! transaction: either the defective unit is cancelled AND its
//! replacement exists, or neither.

use serde::{Deserialize, Serialize};

use presshub_core::error::CoreError;
use presshub_core::status::{resolve_active_unit_statuses, ProductionStatus};
use presshub_core::types::DbId;
use presshub_db::repositories::{
    BatchItemRepo, BatchRepo, ClassificationRuleRepo, OrderItemRepo, OrderRepo, ProductRepo,
    UnitRepo,
};

use crate::allocator::create_batch_for_rule;
use crate::cascade::{self, decode_statuses};
use crate::error::EngineError;
use crate::sync::PlatformSideEffect;
use crate::{autostatus, Engine};

/// Why a unit is being replaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReplacementReason {
    Redesign,
    Reprint,
}

/// Result of a completed replacement.
#[derive(Debug, Clone, Serialize)]
pub struct ReplacementOutcome {
    pub cancelled_unit_id: DbId,
    pub new_unit_id: DbId,
    pub new_unit_token: String,
    pub old_batch_id: DbId,
    pub old_batch_name: String,
    pub new_batch_id: DbId,
    pub new_batch_name: String,
    pub reason: ReplacementReason,
}

impl Engine {
    /// Cancel a defective unit and create its replacement.
    ///
    /// The target batch must be open (PENDING or WAITING_BATCH) with
    /// spare capacity; a new batch is created exactly like the allocator
    /// would when none qualifies. Both touched batches are auto-promoted
    /// before commit.
    pub async fn replace_unit(
        &self,
        unit_id: DbId,
        reason: ReplacementReason,
    ) -> Result<(ReplacementOutcome, Vec<PlatformSideEffect>), EngineError> {
        let mut tx = self.pool().begin().await?;
        let mut side_effects = Vec::new();

        // 1. Load the unit and its ownership chain.
        let unit = UnitRepo::find_by_id(&mut *tx, unit_id)
            .await?
            .ok_or(CoreError::NotFound {
                entity: "BatchItemUnit",
                id: unit_id,
            })?;
        if unit.status().is_terminal() {
            return Err(CoreError::Precondition {
                expected: "a non-terminal status".to_string(),
                current: unit.status(),
            }
            .into());
        }

        let old_batch_item = BatchItemRepo::find_by_id(&mut *tx, unit.batch_item_id)
            .await?
            .ok_or(CoreError::NotFound {
                entity: "BatchItem",
                id: unit.batch_item_id,
            })?;
        let old_batch = BatchRepo::find_by_id(&mut *tx, old_batch_item.batch_id)
            .await?
            .ok_or(CoreError::NotFound {
                entity: "Batch",
                id: old_batch_item.batch_id,
            })?;
        let order_item = OrderItemRepo::find_by_id(&mut *tx, old_batch_item.order_item_id)
            .await?
            .ok_or(CoreError::NotFound {
                entity: "OrderItem",
                id: old_batch_item.order_item_id,
            })?;
        let order = OrderRepo::find_by_id(&mut *tx, order_item.order_id)
            .await?
            .ok_or(CoreError::NotFound {
                entity: "Order",
                id: order_item.order_id,
            })?;
        let product = ProductRepo::find_by_id(&mut *tx, order_item.product_id)
            .await?
            .ok_or(CoreError::NotFound {
                entity: "Product",
                id: order_item.product_id,
            })?;

        tracing::info!(unit_id, ?reason, "Creating replacement unit");

        // 2. Cancel the defective unit.
        UnitRepo::set_status(&mut *tx, unit_id, ProductionStatus::Cancelled.id()).await?;

        // 3. Re-resolve the classification rule for the product.
        let type_name = product.product_type.as_deref().ok_or_else(|| {
            CoreError::Validation(format!("Product {} has no product type", product.id))
        })?;
        let rule = ClassificationRuleRepo::find_pod_rule(&mut *tx, order.store_id, type_name)
            .await?
            .ok_or_else(|| {
                CoreError::Validation(format!("No POD rule for product type '{type_name}'"))
            })?;

        // 4. Find an open batch with spare capacity, or create one the
        //    same way the allocator does.
        let target_batch = match BatchRepo::find_open_for_rule(&mut *tx, rule.id).await? {
            Some(batch) => batch,
            None => {
                create_batch_for_rule(&mut *tx, order.store_id, &rule, None, rule.requires_stock)
                    .await?
            }
        };

        // 5. Find or create the batch item for this order item in the
        //    target batch. A fresh one starts at quantity zero.
        let target_item = match BatchItemRepo::find_by_batch_and_order_item(
            &mut *tx,
            target_batch.id,
            order_item.id,
        )
        .await?
        {
            Some(item) => item,
            None => {
                BatchItemRepo::create(
                    &mut *tx,
                    target_batch.id,
                    order_item.id,
                    0,
                    ProductionStatus::WaitingBatch,
                )
                .await?
            }
        };

        // 6. Create the replacement unit with a fresh scan code.
        let (token, url) = self.codes().unit_code();
        let new_unit = UnitRepo::insert_one(
            &mut *tx,
            target_item.id,
            ProductionStatus::WaitingBatch,
            Some(&token),
            Some(&url),
        )
        .await?;

        BatchItemRepo::add_quantity(&mut *tx, target_item.id, 1).await?;
        let updated = BatchRepo::add_capacity(&mut *tx, target_batch.id, 1)
            .await
            .map_err(|e| EngineError::from_capacity_increment(e, target_batch.id))?;
        if updated.capacity > updated.max_capacity {
            return Err(EngineError::CapacityConflict {
                batch_id: target_batch.id,
            });
        }

        // 7. Recompute the old batch item from its remaining units, the
        //    order item from its non-cancelled units, then cascade.
        let old_unit_statuses =
            UnitRepo::statuses_for_batch_item(&mut *tx, old_batch_item.id).await?;
        let old_item_status = resolve_active_unit_statuses(&decode_statuses(old_unit_statuses));
        BatchItemRepo::set_status(&mut *tx, old_batch_item.id, old_item_status.id()).await?;

        let item_unit_statuses =
            UnitRepo::statuses_for_order_item(&mut *tx, order_item.id).await?;
        let item_status = resolve_active_unit_statuses(&decode_statuses(item_unit_statuses));
        OrderItemRepo::set_status(&mut *tx, order_item.id, item_status.id()).await?;

        let outcome = cascade::propagate(&mut *tx, order.id).await?;
        side_effects.extend(outcome.side_effect);

        // 8. Auto-promote both batches: the old one lost a unit's worth
        //    of active work, the new one gained one.
        let (_, effects) =
            autostatus::auto_promote_within(&mut *tx, old_batch.id, self.codes()).await?;
        side_effects.extend(effects);
        if target_batch.id != old_batch.id {
            let (_, effects) =
                autostatus::auto_promote_within(&mut *tx, target_batch.id, self.codes()).await?;
            side_effects.extend(effects);
        }

        tx.commit().await?;

        tracing::info!(
            cancelled = unit_id,
            replacement = new_unit.id,
            batch = %target_batch.name,
            "Replacement unit created"
        );

        Ok((
            ReplacementOutcome {
                cancelled_unit_id: unit_id,
                new_unit_id: new_unit.id,
                new_unit_token: token,
                old_batch_id: old_batch.id,
                old_batch_name: old_batch.name,
                new_batch_id: target_batch.id,
                new_batch_name: target_batch.name,
                reason,
            },
            side_effects,
        ))
    }
}
