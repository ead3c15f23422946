//! Handlers for order-item operations.

use axum::extract::{Path, State};
use axum::Json;

use presshub_core::types::DbId;

use crate::error::AppResult;
use crate::state::AppState;

/// POST /order-items/{id}/return -- mark a fulfilled line item returned.
/// A fully returned order triggers refund creation post-commit.
pub async fn mark_returned(
    State(state): State<AppState>,
    Path(order_item_id): Path<DbId>,
) -> AppResult<Json<serde_json::Value>> {
    let effects = state.engine.mark_order_item_returned(order_item_id).await?;
    state.sync.run(&state.pool, &effects).await;
    Ok(Json(serde_json::json!({ "order_item_id": order_item_id, "returned": true })))
}
