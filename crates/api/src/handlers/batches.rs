//! Handlers for batch operations.

use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use presshub_core::status::ProductionStatus;
use presshub_core::types::DbId;
use presshub_engine::BatchCodes;

use crate::error::{AppError, AppResult};
use crate::state::AppState;

/// Request payload for a manual status override.
#[derive(Deserialize)]
pub struct UpdateStatusRequest {
    pub status: String,
}

/// Response payload for code generation.
#[derive(Serialize)]
pub struct BatchCodesResponse {
    pub batch_token: String,
    pub batch_url: String,
    pub unit_count: usize,
    pub unit_urls: Vec<String>,
}

impl From<BatchCodes> for BatchCodesResponse {
    fn from(codes: BatchCodes) -> Self {
        Self {
            batch_token: codes.batch_token,
            batch_url: codes.batch_url,
            unit_count: codes.unit_codes.len(),
            unit_urls: codes.unit_codes.into_iter().map(|c| c.url).collect(),
        }
    }
}

/// PATCH /batches/{id}/status -- operator override, cascading through
/// items, units, and owning orders.
pub async fn update_status(
    State(state): State<AppState>,
    Path(batch_id): Path<DbId>,
    Json(request): Json<UpdateStatusRequest>,
) -> AppResult<Json<serde_json::Value>> {
    let status = ProductionStatus::parse(&request.status)
        .ok_or_else(|| AppError::BadRequest(format!("Invalid batch status {}", request.status)))?;

    let effects = state.engine.override_batch_status(batch_id, status).await?;
    state.sync.run(&state.pool, &effects).await;

    Ok(Json(serde_json::json!({ "batch_id": batch_id, "status": status })))
}

/// POST /batches/{id}/codes -- (re)generate label scan codes.
pub async fn generate_codes(
    State(state): State<AppState>,
    Path(batch_id): Path<DbId>,
) -> AppResult<Json<BatchCodesResponse>> {
    let codes = state.engine.generate_batch_codes(batch_id).await?;
    Ok(Json(codes.into()))
}

/// POST /batches/{id}/auto-status -- idempotent auto-status recompute.
pub async fn auto_status(
    State(state): State<AppState>,
    Path(batch_id): Path<DbId>,
) -> AppResult<Json<serde_json::Value>> {
    let (status, effects) = state.engine.auto_promote(batch_id).await?;
    state.sync.run(&state.pool, &effects).await;

    Ok(Json(serde_json::json!({
        "batch_id": batch_id,
        "changed": status.is_some(),
        "status": status,
    })))
}
