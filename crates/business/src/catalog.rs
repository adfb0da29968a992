//! Catalog Service - catalog management and per-user grants

use crate::error::{BusinessError, BusinessResult};
use crate::services::ServiceContext;
use anyhow::Context;
use chrono::Utc;
use gatehouse_core::{CatalogEntry, NewCatalogEntry, UserApp, UserProfile};
use gatehouse_persistence::{CatalogRepo, GrantRepo, ProfileRepo};
use tracing::info;
use uuid::Uuid;

/// Catalog Service
pub struct CatalogService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> CatalogService<'a> {
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// All entries, inactive included, ordered by name
    pub async fn list_all(&self) -> BusinessResult<Vec<CatalogEntry>> {
        let rows = CatalogRepo::list_all(self.ctx.pool())
            .await
            .context("Failed to fetch apps")?;
        Ok(rows.into_iter().map(CatalogEntry::from).collect())
    }

    /// Create a new entry, active by default
    pub async fn create(&self, input: NewCatalogEntry) -> BusinessResult<CatalogEntry> {
        let now = Utc::now();
        let entry = CatalogEntry {
            id: Uuid::new_v4().to_string(),
            name: input.name,
            description: input.description,
            url: input.url,
            icon_url: input.icon_url,
            category: input.category,
            is_active: true,
            created_at: now,
            updated_at: now,
        };

        CatalogRepo::insert(self.ctx.pool(), &entry)
            .await
            .context("Failed to create app")?;

        info!(app_id = %entry.id, name = %entry.name, "Catalog entry created");
        Ok(entry)
    }

    /// Toggle an entry. Existing grants are not revoked.
    pub async fn set_active(&self, app_id: &str, is_active: bool) -> BusinessResult<CatalogEntry> {
        match CatalogRepo::set_active(self.ctx.pool(), app_id, is_active).await {
            Ok(()) => {}
            Err(e) if e.is_not_found() => {
                return Err(BusinessError::not_found("CatalogEntry", app_id).into())
            }
            Err(e) => return Err(anyhow::Error::from(e).context("Failed to update app")),
        }

        info!(app_id, is_active, "Catalog entry toggled");
        let row = CatalogRepo::get_by_id(self.ctx.pool(), app_id).await?;
        Ok(row.into())
    }

    /// The user's apps with their catalog entries.
    ///
    /// Only APPROVED users have apps. Any other status, or a missing
    /// profile, yields an empty list rather than an error.
    pub async fn user_apps(&self, user_id: &str) -> BusinessResult<Vec<UserApp>> {
        let profile = ProfileRepo::find_by_id(self.ctx.pool(), user_id)
            .await
            .context("Failed to fetch profile")?;

        let approved = match profile {
            Some(row) => UserProfile::try_from(row)
                .map_err(BusinessError::from)?
                .can_access_apps(),
            None => false,
        };
        if !approved {
            return Ok(Vec::new());
        }

        let rows = GrantRepo::list_user_apps(self.ctx.pool(), user_id)
            .await
            .context("Failed to fetch apps")?;
        Ok(rows.into_iter().map(UserApp::from).collect())
    }
}
