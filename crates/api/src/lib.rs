//! # Gatehouse API
//!
//! REST API cho portal: profile và apps của user, admin directory,
//! approve/reject, catalog, webhook từ identity provider.

pub mod config;
pub mod handlers;
pub mod routes;
pub mod state;

pub use config::{ConfigError, GatehouseConfig};
pub use routes::create_router;
pub use state::AppState;
