//! # Gatehouse Persistence
//!
//! Persistence layer cho Gatehouse - SQLite qua sqlx.
//!
//! ## Tables
//!
//! ```text
//! ┌────────────────┐     ┌───────────────────┐
//! │ user_profiles  │◀────│ approval_requests │  (1:1, audit)
//! └────────────────┘     └───────────────────┘
//!         ▲
//!         │         ┌─────────────┐
//!    ┌──────────┐   │ app_catalog │
//!    │ user_apps│──▶└─────────────┘
//!    └──────────┘   (grant = user × app)
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use gatehouse_persistence::{Database, ProfileRepo};
//!
//! let db = Database::init("sqlite:data/gatehouse.db", 5).await?;
//! let profile = ProfileRepo::find_by_id(db.pool(), "user_123").await?;
//! ```

pub mod error;
pub mod sqlite;

pub use error::{PersistenceError, PersistenceResult};
pub use sqlite::schema::{
    ApprovalRequestRow, CatalogEntryRow, DirectoryRow, GrantRow, UserAppRow, UserProfileRow,
};
pub use sqlite::{
    create_pool, init_database, init_memory_database, ping, run_migrations, ApprovalRequestRepo,
    CatalogRepo, DecisionUpdate, GrantRepo, ProfileRepo,
};

use sqlx::SqlitePool;

/// Database mặc định khi không cấu hình `DATABASE_URL`
pub const DEFAULT_DATABASE_URL: &str = "sqlite:data/gatehouse.db";

/// Database facade
#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Kết nối và chạy migrations
    pub async fn init(db_url: &str, max_connections: u32) -> PersistenceResult<Self> {
        let pool = init_database(db_url, max_connections).await?;
        Ok(Self { pool })
    }

    /// Get SQLite connection pool
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}
