//! # Identity Module
//!
//! Payload của event từ identity provider. Chỉ `user.created` được dùng để
//! seed `UserProfile` + `ApprovalRequest`; các event khác được bỏ qua.

use crate::error::{CoreError, CoreResult};
use serde::Deserialize;

/// Event type tạo user mới
pub const USER_CREATED: &str = "user.created";

/// Envelope của event
#[derive(Debug, Clone, Deserialize)]
pub struct IdentityEvent {
    #[serde(rename = "type")]
    pub event_type: String,
    #[serde(default)]
    pub data: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct UserCreatedData {
    id: Option<String>,
    #[serde(default)]
    email_addresses: Vec<EmailAddress>,
    first_name: Option<String>,
    last_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct EmailAddress {
    email_address: Option<String>,
}

/// Identity mới cần seed vào profile store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewIdentity {
    pub id: String,
    pub email: String,
    pub full_name: String,
}

impl IdentityEvent {
    /// Parse raw body (đã verify signature) thành event
    pub fn parse(payload: &[u8]) -> CoreResult<Self> {
        serde_json::from_slice(payload).map_err(|e| CoreError::MalformedEvent(e.to_string()))
    }

    pub fn is_user_created(&self) -> bool {
        self.event_type == USER_CREATED
    }

    /// Trích identity từ `user.created`; các event khác trả về `None`.
    ///
    /// Email là địa chỉ đầu tiên trong `email_addresses`. Tên hiển thị là
    /// "first last" đã trim, hoặc email nếu cả hai đều trống.
    pub fn new_identity(&self) -> CoreResult<Option<NewIdentity>> {
        if !self.is_user_created() {
            return Ok(None);
        }

        let data: UserCreatedData = serde_json::from_value(self.data.clone())
            .map_err(|e| CoreError::MalformedEvent(e.to_string()))?;

        let id = data
            .id
            .filter(|id| !id.trim().is_empty())
            .ok_or_else(|| CoreError::MalformedEvent("user id missing".to_string()))?;

        let email = data
            .email_addresses
            .into_iter()
            .next()
            .and_then(|e| e.email_address)
            .filter(|e| !e.trim().is_empty())
            .ok_or_else(|| CoreError::MalformedEvent(format!("user {} has no email", id)))?;

        let full_name = format!(
            "{} {}",
            data.first_name.unwrap_or_default(),
            data.last_name.unwrap_or_default()
        )
        .trim()
        .to_string();
        let full_name = if full_name.is_empty() {
            email.clone()
        } else {
            full_name
        };

        Ok(Some(NewIdentity {
            id,
            email,
            full_name,
        }))
    }
}
