use std::net::SocketAddr;
use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use presshub_api::config::ServerConfig;
use presshub_api::router::build_app_router;
use presshub_api::state::AppState;
use presshub_commerce::CommerceClient;
use presshub_engine::{Engine, PlatformSync, ScanCodeConfig};
use presshub_shipping::ShippingClient;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "presshub_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env();
    tracing::info!(host = %config.host, port = %config.port, "Loaded server configuration");

    // --- Database ---
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    let pool = presshub_db::create_pool(&database_url)
        .await
        .expect("Failed to connect to database");
    tracing::info!("Database connection pool created");

    presshub_db::health_check(&pool)
        .await
        .expect("Database health check failed");

    presshub_db::run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Database migrations applied");

    // --- Engine + platform sync ---
    let engine = Engine::new(pool.clone(), ScanCodeConfig::new(&config.public_host));
    let carrier_webhook = Some(format!("{}/api/v1/webhooks/carrier", config.public_host));
    let sync = Arc::new(PlatformSync::new(
        CommerceClient::new(),
        ShippingClient::new(),
        carrier_webhook,
    ));

    let state = AppState {
        pool,
        engine,
        sync,
        config: Arc::new(config.clone()),
    };

    // --- Router + server ---
    let app = build_app_router(state, &config);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .expect("Invalid HOST/PORT combination");
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind listen address");
    tracing::info!(%addr, "presshub API listening");

    axum::serve(listener, app)
        .await
        .expect("Server error");
}
