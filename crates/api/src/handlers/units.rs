//! Handlers for unit operations.

use axum::extract::{Path, State};
use axum::Json;
use serde::Deserialize;

use presshub_core::types::DbId;
use presshub_engine::{ReplacementOutcome, ReplacementReason};

use crate::error::AppResult;
use crate::state::AppState;

/// Request payload for the replacement workflow.
#[derive(Deserialize)]
pub struct ReplaceRequest {
    pub reason: ReplacementReason,
}

/// POST /units/{id}/replace -- cancel a defective unit and create its
/// replacement in an open batch.
pub async fn replace(
    State(state): State<AppState>,
    Path(unit_id): Path<DbId>,
    Json(request): Json<ReplaceRequest>,
) -> AppResult<Json<ReplacementOutcome>> {
    let (outcome, effects) = state.engine.replace_unit(unit_id, request.reason).await?;
    state.sync.run(&state.pool, &effects).await;
    Ok(Json(outcome))
}
