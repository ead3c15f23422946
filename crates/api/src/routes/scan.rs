//! Route definitions for production-floor scans.

use axum::routing::post;
use axum::Router;

use crate::handlers::scan;
use crate::state::AppState;

/// Routes mounted at `/scan`. Stations address work purely by token.
///
/// ```text
/// POST /batch/{token}          -> printer marks the batch PRINTED
/// POST /unit/{token}/cut       -> cutter marks one unit CUT
/// POST /unit/{token}/pack      -> fulfillment marks one unit PACKED
/// POST /unit/{token}/fulfill   -> carrier handoff marks one unit FULFILLED
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/batch/{token}", post(scan::batch_printed))
        .route("/unit/{token}/cut", post(scan::unit_cut))
        .route("/unit/{token}/pack", post(scan::unit_packed))
        .route("/unit/{token}/fulfill", post(scan::unit_fulfilled))
}
