//! Handlers for webhook intake.
//!
//! Signature verification and de-duplication of raw platform payloads
//! happen upstream; this endpoint receives validated
//! [`OrderCreatedEvent`]s routed by shop domain.

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::Json;

use presshub_core::order_events::OrderCreatedEvent;
use presshub_db::repositories::StoreRepo;

use crate::error::{AppError, AppResult};
use crate::state::AppState;

/// Header carrying the originating shop's domain.
const SHOP_DOMAIN_HEADER: &str = "x-shop-domain";

/// POST /webhooks/orders -- ingest an order-created event.
pub async fn orders_create(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(event): Json<OrderCreatedEvent>,
) -> AppResult<StatusCode> {
    let shop_domain = headers
        .get(SHOP_DOMAIN_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| AppError::BadRequest(format!("Missing {SHOP_DOMAIN_HEADER} header")))?;

    let mut conn = state.pool.acquire().await.map_err(AppError::Database)?;
    let store = StoreRepo::find_by_domain(&mut conn, shop_domain)
        .await
        .map_err(AppError::Database)?
        .ok_or_else(|| AppError::BadRequest(format!("Unknown shop domain {shop_domain}")))?;
    drop(conn);

    state.engine.ingest_order(store.id, &event).await?;
    Ok(StatusCode::OK)
}
