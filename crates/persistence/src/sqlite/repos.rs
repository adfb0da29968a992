//! Repository implementations cho SQLite
//!
//! CRUD operations cho tất cả các tables. Các hàm nhận `Executor` generic nên
//! dùng được cả với `&SqlitePool` lẫn connection trong transaction
//! (`&mut *tx`).

use crate::error::{PersistenceError, PersistenceResult};
use crate::sqlite::schema::*;
use chrono::{DateTime, Utc};
use gatehouse_core::{AccessStatus, ApprovalRequest, CatalogEntry, Role, UserProfile};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Executor, Sqlite, SqlitePool};
use std::str::FromStr;

// ============================================================================
// Profile Repository
// ============================================================================

/// Repository cho user_profiles table
pub struct ProfileRepo;

impl ProfileRepo {
    /// Lấy profile theo identity key
    pub async fn find_by_id<'e, E>(executor: E, id: &str) -> PersistenceResult<Option<UserProfileRow>>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let row = sqlx::query_as::<_, UserProfileRow>("SELECT * FROM user_profiles WHERE id = ?")
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(row)
    }

    /// Lấy profile theo ID, NotFound nếu không có
    pub async fn get_by_id<'e, E>(executor: E, id: &str) -> PersistenceResult<UserProfileRow>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        Self::find_by_id(executor, id)
            .await?
            .ok_or_else(|| PersistenceError::not_found("UserProfile", id))
    }

    /// Thêm profile nếu chưa tồn tại. Trả về `true` nếu row mới được tạo.
    pub async fn insert_if_absent<'e, E>(executor: E, profile: &UserProfile) -> PersistenceResult<bool>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let result = sqlx::query(
            r#"
            INSERT OR IGNORE INTO user_profiles (id, email, full_name, role, status, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&profile.id)
        .bind(&profile.email)
        .bind(&profile.full_name)
        .bind(profile.role.as_str())
        .bind(profile.status.as_str())
        .bind(profile.created_at)
        .bind(profile.updated_at)
        .execute(executor)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    /// Cập nhật status
    pub async fn update_status<'e, E>(
        executor: E,
        id: &str,
        status: AccessStatus,
        now: DateTime<Utc>,
    ) -> PersistenceResult<()>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let result = sqlx::query("UPDATE user_profiles SET status = ?, updated_at = ? WHERE id = ?")
            .bind(status.as_str())
            .bind(now)
            .bind(id)
            .execute(executor)
            .await?;

        if result.rows_affected() == 0 {
            return Err(PersistenceError::not_found("UserProfile", id));
        }
        Ok(())
    }

    /// Cập nhật tên hiển thị
    pub async fn update_full_name(
        pool: &SqlitePool,
        id: &str,
        full_name: &str,
    ) -> PersistenceResult<UserProfileRow> {
        let result = sqlx::query("UPDATE user_profiles SET full_name = ?, updated_at = ? WHERE id = ?")
            .bind(full_name)
            .bind(Utc::now())
            .bind(id)
            .execute(pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(PersistenceError::not_found("UserProfile", id));
        }
        Self::get_by_id(pool, id).await
    }

    /// Đổi role (admin bootstrap)
    pub async fn set_role(pool: &SqlitePool, id: &str, role: Role) -> PersistenceResult<()> {
        let result = sqlx::query("UPDATE user_profiles SET role = ?, updated_at = ? WHERE id = ?")
            .bind(role.as_str())
            .bind(Utc::now())
            .bind(id)
            .execute(pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(PersistenceError::not_found("UserProfile", id));
        }
        Ok(())
    }

    /// Danh sách profiles (mới nhất trước) kèm approval request
    pub async fn list_directory(
        pool: &SqlitePool,
        status: Option<AccessStatus>,
        limit: i64,
        offset: i64,
    ) -> PersistenceResult<Vec<DirectoryRow>> {
        let rows = sqlx::query_as::<_, DirectoryRow>(
            r#"
            SELECT p.id, p.email, p.full_name, p.role, p.status, p.created_at, p.updated_at,
                   r.id AS request_id, r.status AS request_status, r.admin_notes,
                   r.approved_by, r.approved_at,
                   r.created_at AS request_created_at, r.updated_at AS request_updated_at
            FROM user_profiles p
            LEFT JOIN approval_requests r ON r.user_id = p.id
            WHERE (?1 IS NULL OR p.status = ?1)
            ORDER BY p.created_at DESC, p.id ASC
            LIMIT ?2 OFFSET ?3
            "#,
        )
        .bind(status.map(|s| s.as_str()))
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await?;
        Ok(rows)
    }

    /// Đếm profiles (có thể lọc theo status)
    pub async fn count(pool: &SqlitePool, status: Option<AccessStatus>) -> PersistenceResult<i64> {
        let row: (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM user_profiles WHERE (?1 IS NULL OR status = ?1)")
                .bind(status.map(|s| s.as_str()))
                .fetch_one(pool)
                .await?;
        Ok(row.0)
    }

    /// Đếm theo từng status
    pub async fn count_by_status(pool: &SqlitePool) -> PersistenceResult<Vec<(String, i64)>> {
        let rows = sqlx::query_as::<_, (String, i64)>(
            "SELECT status, COUNT(*) FROM user_profiles GROUP BY status",
        )
        .fetch_all(pool)
        .await?;
        Ok(rows)
    }

    /// Đếm profiles tạo từ thời điểm `since`
    pub async fn count_created_since(
        pool: &SqlitePool,
        since: DateTime<Utc>,
    ) -> PersistenceResult<i64> {
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM user_profiles WHERE created_at >= ?")
            .bind(since)
            .fetch_one(pool)
            .await?;
        Ok(row.0)
    }
}

// ============================================================================
// Approval Request Repository
// ============================================================================

/// Terminal decision ghi vào approval_requests
#[derive(Debug, Clone)]
pub struct DecisionUpdate<'a> {
    pub status: AccessStatus,
    pub admin_notes: Option<&'a str>,
    pub approved_by: Option<&'a str>,
    pub approved_at: Option<DateTime<Utc>>,
    pub decided_at: DateTime<Utc>,
}

/// Repository cho approval_requests table
pub struct ApprovalRequestRepo;

impl ApprovalRequestRepo {
    /// Thêm request nếu user chưa có. Trả về `true` nếu row mới được tạo.
    pub async fn insert_if_absent<'e, E>(
        executor: E,
        request: &ApprovalRequest,
    ) -> PersistenceResult<bool>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let result = sqlx::query(
            r#"
            INSERT OR IGNORE INTO approval_requests
                (id, user_id, status, admin_notes, approved_by, approved_at, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&request.id)
        .bind(&request.user_id)
        .bind(request.status.as_str())
        .bind(&request.admin_notes)
        .bind(&request.approved_by)
        .bind(request.approved_at)
        .bind(request.created_at)
        .bind(request.updated_at)
        .execute(executor)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    /// Lấy request theo ID
    pub async fn find_by_id<'e, E>(
        executor: E,
        id: &str,
    ) -> PersistenceResult<Option<ApprovalRequestRow>>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let row =
            sqlx::query_as::<_, ApprovalRequestRow>("SELECT * FROM approval_requests WHERE id = ?")
                .bind(id)
                .fetch_optional(executor)
                .await?;
        Ok(row)
    }

    /// Lấy request của user
    pub async fn find_by_user<'e, E>(
        executor: E,
        user_id: &str,
    ) -> PersistenceResult<Option<ApprovalRequestRow>>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let row = sqlx::query_as::<_, ApprovalRequestRow>(
            "SELECT * FROM approval_requests WHERE user_id = ?",
        )
        .bind(user_id)
        .fetch_optional(executor)
        .await?;
        Ok(row)
    }

    /// Ghi decision chỉ khi request còn PENDING và thuộc về `user_id`.
    ///
    /// Trả về `false` nếu không có row nào thỏa điều kiện (không tồn tại,
    /// sai user, hoặc đã được quyết định).
    pub async fn decide_if_pending<'e, E>(
        executor: E,
        id: &str,
        user_id: &str,
        update: &DecisionUpdate<'_>,
    ) -> PersistenceResult<bool>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let result = sqlx::query(
            r#"
            UPDATE approval_requests
            SET status = ?, admin_notes = ?, approved_by = ?, approved_at = ?, updated_at = ?
            WHERE id = ? AND user_id = ? AND status = 'PENDING'
            "#,
        )
        .bind(update.status.as_str())
        .bind(update.admin_notes)
        .bind(update.approved_by)
        .bind(update.approved_at)
        .bind(update.decided_at)
        .bind(id)
        .bind(user_id)
        .execute(executor)
        .await?;
        Ok(result.rows_affected() == 1)
    }
}

// ============================================================================
// Catalog Repository
// ============================================================================

/// Repository cho app_catalog table
pub struct CatalogRepo;

impl CatalogRepo {
    /// Lấy tất cả entries, sắp xếp theo tên
    pub async fn list_all(pool: &SqlitePool) -> PersistenceResult<Vec<CatalogEntryRow>> {
        let rows = sqlx::query_as::<_, CatalogEntryRow>("SELECT * FROM app_catalog ORDER BY name")
            .fetch_all(pool)
            .await?;
        Ok(rows)
    }

    /// ID của các entries đang active
    pub async fn list_active_ids<'e, E>(executor: E) -> PersistenceResult<Vec<String>>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let rows = sqlx::query_as::<_, (String,)>(
            "SELECT id FROM app_catalog WHERE is_active = 1 ORDER BY name",
        )
        .fetch_all(executor)
        .await?;
        Ok(rows.into_iter().map(|(id,)| id).collect())
    }

    /// Lấy entry theo ID
    pub async fn get_by_id(pool: &SqlitePool, id: &str) -> PersistenceResult<CatalogEntryRow> {
        sqlx::query_as::<_, CatalogEntryRow>("SELECT * FROM app_catalog WHERE id = ?")
            .bind(id)
            .fetch_optional(pool)
            .await?
            .ok_or_else(|| PersistenceError::not_found("CatalogEntry", id))
    }

    /// Thêm entry mới
    pub async fn insert(pool: &SqlitePool, entry: &CatalogEntry) -> PersistenceResult<()> {
        sqlx::query(
            r#"
            INSERT INTO app_catalog (id, name, description, url, icon_url, category, is_active, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&entry.id)
        .bind(&entry.name)
        .bind(&entry.description)
        .bind(&entry.url)
        .bind(&entry.icon_url)
        .bind(&entry.category)
        .bind(entry.is_active)
        .bind(entry.created_at)
        .bind(entry.updated_at)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Bật/tắt entry
    pub async fn set_active(pool: &SqlitePool, id: &str, is_active: bool) -> PersistenceResult<()> {
        let result = sqlx::query("UPDATE app_catalog SET is_active = ?, updated_at = ? WHERE id = ?")
            .bind(is_active)
            .bind(Utc::now())
            .bind(id)
            .execute(pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(PersistenceError::not_found("CatalogEntry", id));
        }
        Ok(())
    }

    /// (total, active)
    pub async fn counts(pool: &SqlitePool) -> PersistenceResult<(i64, i64)> {
        let row: (i64, i64) =
            sqlx::query_as("SELECT COUNT(*), COALESCE(SUM(is_active), 0) FROM app_catalog")
                .fetch_one(pool)
                .await?;
        Ok(row)
    }
}

// ============================================================================
// Grant Repository
// ============================================================================

/// Repository cho user_apps table
pub struct GrantRepo;

impl GrantRepo {
    /// Thêm grant, bỏ qua nếu cặp (user, app) đã tồn tại.
    /// Trả về `true` nếu row mới được tạo.
    pub async fn insert_if_absent<'e, E>(
        executor: E,
        user_id: &str,
        app_id: &str,
        granted_at: DateTime<Utc>,
    ) -> PersistenceResult<bool>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let result = sqlx::query(
            "INSERT OR IGNORE INTO user_apps (id, user_id, app_id, granted_at) VALUES (?, ?, ?, ?)",
        )
        .bind(uuid::Uuid::new_v4().to_string())
        .bind(user_id)
        .bind(app_id)
        .bind(granted_at)
        .execute(executor)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    /// Grants của user
    pub async fn list_for_user(pool: &SqlitePool, user_id: &str) -> PersistenceResult<Vec<GrantRow>> {
        let rows = sqlx::query_as::<_, GrantRow>(
            "SELECT * FROM user_apps WHERE user_id = ? ORDER BY granted_at ASC, app_id ASC",
        )
        .bind(user_id)
        .fetch_all(pool)
        .await?;
        Ok(rows)
    }

    /// Grants của user JOIN catalog
    pub async fn list_user_apps(
        pool: &SqlitePool,
        user_id: &str,
    ) -> PersistenceResult<Vec<UserAppRow>> {
        let rows = sqlx::query_as::<_, UserAppRow>(
            r#"
            SELECT g.id AS grant_id, g.user_id, g.app_id, g.granted_at,
                   c.name, c.description, c.url, c.icon_url, c.category, c.is_active,
                   c.created_at, c.updated_at
            FROM user_apps g
            JOIN app_catalog c ON c.id = g.app_id
            WHERE g.user_id = ?
            ORDER BY c.name
            "#,
        )
        .bind(user_id)
        .fetch_all(pool)
        .await?;
        Ok(rows)
    }
}

// ============================================================================
// Database initialization
// ============================================================================

/// Khởi tạo database connection pool
pub async fn create_pool(database_url: &str, max_connections: u32) -> PersistenceResult<SqlitePool> {
    let options = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .foreign_keys(true);

    // create_if_missing tạo file nhưng không tạo thư mục cha
    if let Some(parent) = options.get_filename().parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|e| {
                PersistenceError::Configuration(format!(
                    "cannot create {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }
    }

    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections)
        .connect_with(options)
        .await?;
    Ok(pool)
}

/// Chạy migrations
pub async fn run_migrations(pool: &SqlitePool) -> PersistenceResult<()> {
    sqlx::migrate!("../../migrations").run(pool).await?;
    Ok(())
}

/// Tạo database với schema
pub async fn init_database(database_url: &str, max_connections: u32) -> PersistenceResult<SqlitePool> {
    if max_connections == 0 {
        return Err(PersistenceError::Configuration(
            "max_connections must be at least 1".to_string(),
        ));
    }

    let pool = create_pool(database_url, max_connections).await?;
    run_migrations(&pool).await?;
    Ok(pool)
}

/// In-memory database với schema, một connection duy nhất giữ suốt vòng đời pool.
///
/// Mỗi connection `sqlite::memory:` là một database riêng nên pool bị giới hạn
/// ở một connection.
pub async fn init_memory_database() -> PersistenceResult<SqlitePool> {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .min_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await?;

    run_migrations(&pool).await?;
    Ok(pool)
}

/// Kiểm tra kết nối
pub async fn ping(pool: &SqlitePool) -> PersistenceResult<()> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}
