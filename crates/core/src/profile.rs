//! # Profile Module
//!
//! `UserProfile` (identity + trạng thái) và `ApprovalRequest` (audit record
//! của quyết định phê duyệt).

use crate::status::AccessStatus;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Vai trò của user trong portal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "user" => Some(Role::User),
            "admin" => Some(Role::Admin),
            _ => None,
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, Role::Admin)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Hồ sơ người dùng.
///
/// Được tạo từ event `user.created` của identity provider, status chỉ do
/// approval engine thay đổi; user chỉ được sửa `full_name`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    /// Identity key từ identity provider
    pub id: String,
    pub email: String,
    pub full_name: String,
    pub role: Role,
    pub status: AccessStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserProfile {
    /// Tạo profile mới ở trạng thái PENDING
    pub fn pending(id: &str, email: &str, full_name: &str) -> Self {
        let now = Utc::now();
        Self {
            id: id.to_string(),
            email: email.to_string(),
            full_name: full_name.to_string(),
            role: Role::User,
            status: AccessStatus::Pending,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }

    /// Chỉ user APPROVED mới thấy danh sách apps
    pub fn can_access_apps(&self) -> bool {
        self.status == AccessStatus::Approved
    }
}

/// Audit record cho một yêu cầu truy cập (tối đa một record mỗi user).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApprovalRequest {
    pub id: String,
    pub user_id: String,
    pub status: AccessStatus,
    /// Ghi chú của admin (chỉ có nghĩa khi reject)
    pub admin_notes: Option<String>,
    /// Admin đã ra quyết định
    pub approved_by: Option<String>,
    /// Chỉ được set khi approve
    pub approved_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ApprovalRequest {
    /// Tạo request PENDING cho user
    pub fn pending(id: &str, user_id: &str) -> Self {
        let now = Utc::now();
        Self {
            id: id.to_string(),
            user_id: user_id.to_string(),
            status: AccessStatus::Pending,
            admin_notes: None,
            approved_by: None,
            approved_at: None,
            created_at: now,
            updated_at: now,
        }
    }
}
