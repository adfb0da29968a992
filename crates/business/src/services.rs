//! Service context
//!
//! Shared database access for all business services.

use gatehouse_persistence::Database;
use sqlx::SqlitePool;

/// Context for business operations - contains database access
#[derive(Clone)]
pub struct ServiceContext {
    pool: SqlitePool,
}

impl ServiceContext {
    /// Create new service context from database
    pub fn new(db: &Database) -> Self {
        Self {
            pool: db.pool().clone(),
        }
    }

    /// Create from pool directly
    pub fn from_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Get database pool
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Fixtures shared by the service tests.

    use super::ServiceContext;
    use chrono::Utc;
    use gatehouse_core::{ApprovalRequest, CatalogEntry, Role, UserProfile};
    use gatehouse_persistence::{
        init_memory_database, ApprovalRequestRepo, CatalogRepo, ProfileRepo,
    };

    pub async fn context() -> ServiceContext {
        ServiceContext::from_pool(init_memory_database().await.unwrap())
    }

    /// Seed a PENDING user and its request `req_<id>`
    pub async fn seed_pending_user(ctx: &ServiceContext, user_id: &str) -> String {
        let profile = UserProfile::pending(user_id, &format!("{}@example.com", user_id), user_id);
        ProfileRepo::insert_if_absent(ctx.pool(), &profile).await.unwrap();
        let request_id = format!("req_{}", user_id);
        let request = ApprovalRequest::pending(&request_id, user_id);
        ApprovalRequestRepo::insert_if_absent(ctx.pool(), &request)
            .await
            .unwrap();
        request_id
    }

    pub async fn seed_admin(ctx: &ServiceContext, user_id: &str) {
        seed_pending_user(ctx, user_id).await;
        ProfileRepo::set_role(ctx.pool(), user_id, Role::Admin)
            .await
            .unwrap();
    }

    pub async fn seed_app(ctx: &ServiceContext, id: &str, is_active: bool) {
        let entry = CatalogEntry {
            id: id.to_string(),
            name: format!("App {}", id),
            description: format!("Description of {}", id),
            url: format!("https://{}.example.com", id),
            icon_url: None,
            category: "general".to_string(),
            is_active,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        CatalogRepo::insert(ctx.pool(), &entry).await.unwrap();
    }
}
