//! Route definitions for webhook intake.

use axum::routing::post;
use axum::Router;

use crate::handlers::webhooks;
use crate::state::AppState;

/// Routes mounted at `/webhooks`.
///
/// ```text
/// POST /orders -> order-created intake
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route("/orders", post(webhooks::orders_create))
}
