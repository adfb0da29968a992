//! Database initialization and connection

use anyhow::{Context, Result};
use gatehouse_business::ServiceContext;
use gatehouse_persistence::Database;
use tracing::debug;

/// Create the database if missing and run migrations
pub async fn init_database(url: &str) -> Result<()> {
    let db = Database::init(url, 1)
        .await
        .with_context(|| format!("Failed to initialize database {}", url))?;
    db.close().await;
    Ok(())
}

/// Connect and make sure the schema is migrated
pub async fn connect(url: &str) -> Result<ServiceContext> {
    let db = Database::init(url, 1)
        .await
        .context("Failed to connect to database. Run 'gatehouse init' first.")?;
    debug!(url, "Database ready");
    Ok(ServiceContext::new(&db))
}
