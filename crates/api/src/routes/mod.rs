//! Route modules, one per resource.

pub mod batches;
pub mod health;
pub mod order_items;
pub mod scan;
pub mod units;
pub mod webhooks;

use axum::Router;

use crate::state::AppState;

/// Routes mounted under `/api/v1`.
///
/// ```text
/// /webhooks/orders                 order-created intake (POST)
/// /scan/batch/{token}              printer scan (POST)
/// /scan/unit/{token}/cut           cutter scan (POST)
/// /scan/unit/{token}/pack         fulfillment scan (POST)
/// /scan/unit/{token}/fulfill      carrier-handoff scan (POST)
/// /batches/{id}/status             manual override (PATCH)
/// /batches/{id}/codes              label code generation (POST)
/// /batches/{id}/auto-status        auto-status recompute (POST)
/// /units/{id}/replace              replacement workflow (POST)
/// /order-items/{id}/return         mark returned (POST)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/webhooks", webhooks::router())
        .nest("/scan", scan::router())
        .nest("/batches", batches::router())
        .nest("/units", units::router())
        .nest("/order-items", order_items::router())
}
