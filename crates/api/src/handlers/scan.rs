//! Handlers for production-floor scans.

use axum::extract::{Path, State};
use axum::Json;
use serde::Serialize;

use presshub_core::types::DbId;
use presshub_core::unit_flow::ScanOutcome;
use presshub_engine::ScanResult;

use crate::error::AppResult;
use crate::state::AppState;

/// Response payload for all scan endpoints.
#[derive(Serialize)]
pub struct ScanResponse {
    pub outcome: &'static str,
    pub batch_id: DbId,
}

impl ScanResponse {
    fn from_result(result: &ScanResult) -> Self {
        Self {
            outcome: match result.outcome {
                ScanOutcome::Applied => "applied",
                ScanOutcome::AlreadyDone => "already_done",
            },
            batch_id: result.batch_id,
        }
    }
}

/// POST /scan/batch/{token} -- printer marks a batch PRINTED.
pub async fn batch_printed(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> AppResult<Json<ScanResponse>> {
    let result = state.engine.scan_batch_printed(&token).await?;
    state.sync.run(&state.pool, &result.side_effects).await;
    Ok(Json(ScanResponse::from_result(&result)))
}

/// POST /scan/unit/{token}/cut -- cutter marks one unit CUT.
pub async fn unit_cut(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> AppResult<Json<ScanResponse>> {
    let result = state.engine.scan_unit_cut(&token).await?;
    state.sync.run(&state.pool, &result.side_effects).await;
    Ok(Json(ScanResponse::from_result(&result)))
}

/// POST /scan/unit/{token}/pack -- fulfillment marks one unit PACKED.
pub async fn unit_packed(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> AppResult<Json<ScanResponse>> {
    let result = state.engine.scan_unit_packed(&token).await?;
    state.sync.run(&state.pool, &result.side_effects).await;
    Ok(Json(ScanResponse::from_result(&result)))
}

/// POST /scan/unit/{token}/fulfill -- carrier handoff marks one unit
/// FULFILLED.
pub async fn unit_fulfilled(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> AppResult<Json<ScanResponse>> {
    let result = state.engine.scan_unit_fulfilled(&token).await?;
    state.sync.run(&state.pool, &result.side_effects).await;
    Ok(Json(ScanResponse::from_result(&result)))
}
