//! Admin directory - paginated user listing and portal statistics

use crate::error::{BusinessError, BusinessResult};
use crate::services::ServiceContext;
use anyhow::Context;
use chrono::{Duration, Utc};
use gatehouse_core::{AccessStatus, ApprovalRequest, UserProfile};
use gatehouse_persistence::{CatalogRepo, ProfileRepo};
use serde::Serialize;

pub const DEFAULT_PAGE_SIZE: i64 = 10;
pub const MAX_PAGE_SIZE: i64 = 100;

/// Largest accepted page; keeps `(page - 1) * limit` within i64
pub const MAX_PAGE: i64 = i64::MAX / MAX_PAGE_SIZE;

/// Window for "recent registrations"
const RECENT_DAYS: i64 = 7;

/// Raw admin query; `normalize` applies defaults and limits
#[derive(Debug, Clone, Default)]
pub struct DirectoryQuery {
    pub status: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

impl DirectoryQuery {
    /// (status filter, page, limit). The status must be exactly `PENDING`,
    /// `APPROVED` or `REJECTED`; anything else is ignored.
    pub fn normalize(&self) -> (Option<AccessStatus>, i64, i64) {
        let status = self.status.as_deref().and_then(AccessStatus::from_str);
        let page = self.page.unwrap_or(1).clamp(1, MAX_PAGE);
        let limit = self
            .limit
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE);
        (status, page, limit)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Pagination {
    pub page: i64,
    pub limit: i64,
    pub total: i64,
    pub total_pages: i64,
}

impl Pagination {
    pub fn new(page: i64, limit: i64, total: i64) -> Self {
        Self {
            page,
            limit,
            total,
            total_pages: (total + limit - 1) / limit,
        }
    }
}

/// Profile with its approval request, if any
#[derive(Debug, Clone, Serialize)]
pub struct DirectoryEntry {
    #[serde(flatten)]
    pub profile: UserProfile,
    pub approval_request: Option<ApprovalRequest>,
}

#[derive(Debug, Clone, Serialize)]
pub struct UserPage {
    pub users: Vec<DirectoryEntry>,
    pub pagination: Pagination,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UserStats {
    pub total: i64,
    pub pending: i64,
    pub approved: i64,
    pub rejected: i64,
    pub recent_registrations: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AppStats {
    pub total: i64,
    pub active: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PortalStats {
    pub users: UserStats,
    pub apps: AppStats,
}

/// Directory Service - read operations for admins
pub struct DirectoryService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> DirectoryService<'a> {
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Newest profiles first, joined with their approval request
    pub async fn list_users(&self, query: &DirectoryQuery) -> BusinessResult<UserPage> {
        let (status, page, limit) = query.normalize();
        let offset = (page - 1).saturating_mul(limit);

        let rows = ProfileRepo::list_directory(self.ctx.pool(), status, limit, offset)
            .await
            .context("Failed to fetch users")?;
        let total = ProfileRepo::count(self.ctx.pool(), status)
            .await
            .context("Failed to count users")?;

        let users = rows
            .into_iter()
            .map(|row| {
                let (profile, approval_request) = row.into_parts()?;
                Ok(DirectoryEntry {
                    profile,
                    approval_request,
                })
            })
            .collect::<Result<Vec<_>, BusinessError>>()?;

        Ok(UserPage {
            users,
            pagination: Pagination::new(page, limit, total),
        })
    }

    pub async fn stats(&self) -> BusinessResult<PortalStats> {
        let pool = self.ctx.pool();
        let mut users = UserStats::default();

        for (status, count) in ProfileRepo::count_by_status(pool)
            .await
            .context("Failed to count users")?
        {
            users.total += count;
            match AccessStatus::from_str(&status) {
                Some(AccessStatus::Pending) => users.pending = count,
                Some(AccessStatus::Approved) => users.approved = count,
                Some(AccessStatus::Rejected) => users.rejected = count,
                None => {}
            }
        }

        let since = Utc::now() - Duration::days(RECENT_DAYS);
        users.recent_registrations = ProfileRepo::count_created_since(pool, since)
            .await
            .context("Failed to count registrations")?;

        let (total, active) = CatalogRepo::counts(pool)
            .await
            .context("Failed to count apps")?;

        Ok(PortalStats {
            users,
            apps: AppStats { total, active },
        })
    }
}
