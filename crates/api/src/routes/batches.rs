//! Route definitions for batch operations.

use axum::routing::{patch, post};
use axum::Router;

use crate::handlers::batches;
use crate::state::AppState;

/// Routes mounted at `/batches`.
///
/// ```text
/// PATCH /{id}/status       -> manual status override
/// POST  /{id}/codes        -> (re)generate label scan codes
/// POST  /{id}/auto-status  -> recompute automatic status
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/{id}/status", patch(batches::update_status))
        .route("/{id}/codes", post(batches::generate_codes))
        .route("/{id}/auto-status", post(batches::auto_status))
}
