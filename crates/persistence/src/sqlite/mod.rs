//! SQLite persistence module
//!
//! Repository pattern cho SQLite database access.

pub mod repos;
pub mod schema;

pub use repos::{
    create_pool, init_database, init_memory_database, ping, run_migrations, ApprovalRequestRepo,
    CatalogRepo, DecisionUpdate, GrantRepo, ProfileRepo,
};
pub use schema::{
    ApprovalRequestRow, CatalogEntryRow, DirectoryRow, GrantRow, UserAppRow, UserProfileRow,
};
