//! # Catalog Module
//!
//! Catalog các ứng dụng bên ngoài và grant (user ↔ app).

use crate::error::{CoreError, CoreResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Category mặc định khi admin không chỉ định
pub const DEFAULT_CATEGORY: &str = "general";

/// Một ứng dụng trong catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
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

/// Input để tạo catalog entry, đã được validate
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCatalogEntry {
    pub name: String,
    pub description: String,
    pub url: String,
    pub category: String,
    pub icon_url: Option<String>,
}

impl NewCatalogEntry {
    /// Validate và chuẩn hóa input.
    ///
    /// `name`, `description`, `url` bắt buộc (sau khi trim). `category` mặc định
    /// là "general", `icon_url` rỗng được lưu là NULL.
    pub fn parse(
        name: Option<&str>,
        description: Option<&str>,
        url: Option<&str>,
        category: Option<&str>,
        icon_url: Option<&str>,
    ) -> CoreResult<Self> {
        let required = |value: Option<&str>, field: &str| -> CoreResult<String> {
            match value.map(str::trim) {
                Some(v) if !v.is_empty() => Ok(v.to_string()),
                _ => Err(CoreError::missing(field)),
            }
        };

        let name = required(name, "name")?;
        let description = required(description, "description")?;
        let url = required(url, "url")?;

        let category = category
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .unwrap_or(DEFAULT_CATEGORY)
            .to_string();
        let icon_url = icon_url
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .map(str::to_string);

        Ok(Self {
            name,
            description,
            url,
            category,
            icon_url,
        })
    }
}

/// Quyền truy cập của user vào một catalog entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Grant {
    pub id: String,
    pub user_id: String,
    pub app_id: String,
    pub granted_at: DateTime<Utc>,
}

/// Grant kèm catalog entry - kết quả của user-apps read path
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserApp {
    #[serde(flatten)]
    pub grant: Grant,
    pub app: CatalogEntry,
}
