//! # Status Module
//!
//! `AccessStatus` là trạng thái dùng chung cho cả `UserProfile` và
//! `ApprovalRequest`. `Decision` là hành động của admin kết thúc PENDING.

use crate::error::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Trạng thái phê duyệt của một user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AccessStatus {
    /// Vừa đăng ký, chờ admin xem xét
    Pending,
    /// Được duyệt - có quyền truy cập catalog
    Approved,
    /// Bị từ chối
    Rejected,
}

impl AccessStatus {
    /// Trả về code string cho DB
    pub fn as_str(&self) -> &'static str {
        match self {
            AccessStatus::Pending => "PENDING",
            AccessStatus::Approved => "APPROVED",
            AccessStatus::Rejected => "REJECTED",
        }
    }

    /// Parse từ code string, khớp chính xác chữ hoa
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "PENDING" => Some(AccessStatus::Pending),
            "APPROVED" => Some(AccessStatus::Approved),
            "REJECTED" => Some(AccessStatus::Rejected),
            _ => None,
        }
    }

    /// APPROVED và REJECTED là terminal
    pub fn is_terminal(&self) -> bool {
        !matches!(self, AccessStatus::Pending)
    }

    /// Áp dụng decision lên trạng thái hiện tại.
    ///
    /// Chỉ PENDING mới nhận decision; trạng thái terminal trả về
    /// `CoreError::AlreadyDecided`.
    pub fn apply(self, decision: Decision) -> CoreResult<AccessStatus> {
        if self.is_terminal() {
            return Err(CoreError::AlreadyDecided(self));
        }
        Ok(decision.target_status())
    }
}

impl fmt::Display for AccessStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Hành động của admin trên một approval request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    Approve,
    Reject,
}

impl Decision {
    pub fn as_str(&self) -> &'static str {
        match self {
            Decision::Approve => "approve",
            Decision::Reject => "reject",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "approve" => Some(Decision::Approve),
            "reject" => Some(Decision::Reject),
            _ => None,
        }
    }

    /// Trạng thái terminal mà decision dẫn tới
    pub fn target_status(&self) -> AccessStatus {
        match self {
            Decision::Approve => AccessStatus::Approved,
            Decision::Reject => AccessStatus::Rejected,
        }
    }

    /// Chỉ approval mới cấp quyền catalog
    pub fn grants_access(&self) -> bool {
        matches!(self, Decision::Approve)
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
