//! Route definitions for unit operations.

use axum::routing::post;
use axum::Router;

use crate::handlers::units;
use crate::state::AppState;

/// Routes mounted at `/units`.
///
/// ```text
/// POST /{id}/replace -> cancel a defective unit and create a replacement
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route("/{id}/replace", post(units::replace))
}
