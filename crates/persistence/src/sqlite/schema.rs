//! Database schema definitions
//!
//! Row types cho sqlx mapping từ SQLite tables.
//! Schema được định nghĩa trong migrations/20261016000000_init.sql

use crate::error::{PersistenceError, PersistenceResult};
use chrono::{DateTime, Utc};
use gatehouse_core::{
    AccessStatus, ApprovalRequest, CatalogEntry, Grant, Role, UserApp, UserProfile,
};
use serde::{Deserialize, Serialize};

/// Row type cho bảng `user_profiles`
#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct UserProfileRow {
    pub id: String,
    pub email: String,
    pub full_name: String,
    pub role: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Row type cho bảng `approval_requests`
#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct ApprovalRequestRow {
    pub id: String,
    pub user_id: String,
    pub status: String,
    pub admin_notes: Option<String>,
    pub approved_by: Option<String>,
    pub approved_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Row type cho bảng `app_catalog`
#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct CatalogEntryRow {
    pub id: String,
    pub name: String,
    pub description: String,
    pub url: String,
    pub icon_url: Option<String>,
    pub category: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Row type cho bảng `user_apps`
#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct GrantRow {
    pub id: String,
    pub user_id: String,
    pub app_id: String,
    pub granted_at: DateTime<Utc>,
}

/// `user_apps` JOIN `app_catalog`
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UserAppRow {
    pub grant_id: String,
    pub user_id: String,
    pub app_id: String,
    pub granted_at: DateTime<Utc>,
    pub name: String,
    pub description: String,
    pub url: String,
    pub icon_url: Option<String>,
    pub category: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// `user_profiles` LEFT JOIN `approval_requests` cho admin directory
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct DirectoryRow {
    pub id: String,
    pub email: String,
    pub full_name: String,
    pub role: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub request_id: Option<String>,
    pub request_status: Option<String>,
    pub admin_notes: Option<String>,
    pub approved_by: Option<String>,
    pub approved_at: Option<DateTime<Utc>>,
    pub request_created_at: Option<DateTime<Utc>>,
    pub request_updated_at: Option<DateTime<Utc>>,
}

// === Conversion implementations ===

fn parse_status(value: &str) -> PersistenceResult<AccessStatus> {
    AccessStatus::from_str(value).ok_or_else(|| PersistenceError::invalid_enum("status", value))
}

fn parse_role(value: &str) -> PersistenceResult<Role> {
    Role::from_str(value).ok_or_else(|| PersistenceError::invalid_enum("role", value))
}

impl TryFrom<UserProfileRow> for UserProfile {
    type Error = PersistenceError;

    fn try_from(row: UserProfileRow) -> PersistenceResult<Self> {
        Ok(Self {
            role: parse_role(&row.role)?,
            status: parse_status(&row.status)?,
            id: row.id,
            email: row.email,
            full_name: row.full_name,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

impl TryFrom<ApprovalRequestRow> for ApprovalRequest {
    type Error = PersistenceError;

    fn try_from(row: ApprovalRequestRow) -> PersistenceResult<Self> {
        Ok(Self {
            status: parse_status(&row.status)?,
            id: row.id,
            user_id: row.user_id,
            admin_notes: row.admin_notes,
            approved_by: row.approved_by,
            approved_at: row.approved_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

impl From<CatalogEntryRow> for CatalogEntry {
    fn from(row: CatalogEntryRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            description: row.description,
            url: row.url,
            icon_url: row.icon_url,
            category: row.category,
            is_active: row.is_active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

impl From<GrantRow> for Grant {
    fn from(row: GrantRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            app_id: row.app_id,
            granted_at: row.granted_at,
        }
    }
}

impl From<UserAppRow> for UserApp {
    fn from(row: UserAppRow) -> Self {
        Self {
            grant: Grant {
                id: row.grant_id,
                user_id: row.user_id,
                app_id: row.app_id.clone(),
                granted_at: row.granted_at,
            },
            app: CatalogEntry {
                id: row.app_id,
                name: row.name,
                description: row.description,
                url: row.url,
                icon_url: row.icon_url,
                category: row.category,
                is_active: row.is_active,
                created_at: row.created_at,
                updated_at: row.updated_at,
            },
        }
    }
}

impl DirectoryRow {
    /// Tách row thành profile + request (nếu có)
    pub fn into_parts(self) -> PersistenceResult<(UserProfile, Option<ApprovalRequest>)> {
        let request = match (
            self.request_id,
            self.request_status,
            self.request_created_at,
            self.request_updated_at,
        ) {
            (Some(id), Some(status), Some(created_at), Some(updated_at)) => Some(ApprovalRequest {
                id,
                user_id: self.id.clone(),
                status: parse_status(&status)?,
                admin_notes: self.admin_notes,
                approved_by: self.approved_by,
                approved_at: self.approved_at,
                created_at,
                updated_at,
            }),
            _ => None,
        };

        let profile = UserProfile {
            role: parse_role(&self.role)?,
            status: parse_status(&self.status)?,
            id: self.id,
            email: self.email,
            full_name: self.full_name,
            created_at: self.created_at,
            updated_at: self.updated_at,
        };

        Ok((profile, request))
    }
}
