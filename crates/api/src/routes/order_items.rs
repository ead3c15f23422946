//! Route definitions for order-item operations.

use axum::routing::post;
use axum::Router;

use crate::handlers::order_items;
use crate::state::AppState;

/// Routes mounted at `/order-items`.
///
/// ```text
/// POST /{id}/return -> mark a fulfilled line item returned
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route("/{id}/return", post(order_items::mark_returned))
}
