use std::sync::Arc;

use presshub_engine::{Engine, PlatformSync};

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via
/// `State<AppState>`. Cheaply cloneable.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: presshub_db::DbPool,
    /// The batch assignment / status propagation engine.
    pub engine: Engine,
    /// Post-commit platform synchronization (commerce + carrier).
    pub sync: Arc<PlatformSync>,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
}
