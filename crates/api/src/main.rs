//! API Server Application

use anyhow::{Context, Result};
use gatehouse_api::{create_router, AppState, GatehouseConfig};
use gatehouse_business::ServiceContext;
use gatehouse_persistence::Database;
use std::net::SocketAddr;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let config = GatehouseConfig::from_env()?;

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let db = Database::init(&config.database_url, config.max_connections)
        .await
        .with_context(|| format!("Failed to open database {}", config.database_url))?;

    let state = AppState::new(ServiceContext::new(&db), &config)?;
    if state.verifier.is_none() {
        warn!("IDENTITY_WEBHOOK_SECRET not set; identity webhook will answer 500");
    }

    let app = create_router(state);

    let addr: SocketAddr = config.bind_address().parse()?;
    info!("🚀 Gatehouse API listening at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    db.close().await;
    Ok(())
}
