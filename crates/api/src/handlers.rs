//! API Handlers

use async_trait::async_trait;
use axum::{
    body::Bytes,
    extract::{FromRequestParts, Query, State},
    http::{request::Parts, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use gatehouse_business::{
    require_admin, BusinessError, CatalogService, DecideCommand, DirectoryQuery, DirectoryService,
    ApprovalEngine, OnboardingService, ProfileService, WebhookHeaders,
};
use gatehouse_core::{CoreError, NewCatalogEntry};
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use tracing::{error, info, warn};

use crate::state::AppState;

pub const SVIX_ID: &str = "svix-id";
pub const SVIX_TIMESTAMP: &str = "svix-timestamp";
pub const SVIX_SIGNATURE: &str = "svix-signature";

// ============ Response Types ============

#[derive(Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(data: T) -> Json<Self> {
        Json(Self {
            success: true,
            data: Some(data),
            error: None,
        })
    }
}

impl ApiResponse<()> {
    pub fn error(message: impl Into<String>) -> Json<Self> {
        Json(Self {
            success: false,
            data: None,
            error: Some(message.into()),
        })
    }
}

/// Lỗi trả về từ handler; status code được chọn theo `BusinessError`
#[derive(Debug)]
pub struct ApiError(anyhow::Error);

impl<E: Into<anyhow::Error>> From<E> for ApiError {
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        let Some(err) = self.0.downcast_ref::<BusinessError>() else {
            return match self.0.downcast_ref::<CoreError>() {
                Some(core) => core_status(core),
                None => StatusCode::INTERNAL_SERVER_ERROR,
            };
        };

        match err {
            BusinessError::Unauthenticated => StatusCode::UNAUTHORIZED,
            BusinessError::Forbidden { .. } => StatusCode::FORBIDDEN,
            BusinessError::Validation(_) => StatusCode::BAD_REQUEST,
            BusinessError::NotFound { .. } => StatusCode::NOT_FOUND,
            BusinessError::AlreadyDecided { .. } => StatusCode::CONFLICT,
            BusinessError::MissingSignatureHeaders
            | BusinessError::InvalidSignature(_)
            | BusinessError::MalformedEvent(_) => StatusCode::BAD_REQUEST,
            BusinessError::Core(core) => core_status(core),
            BusinessError::WebhookMisconfigured(_) | BusinessError::Persistence(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

fn core_status(err: &CoreError) -> StatusCode {
    if err.is_validation_error() || matches!(err, CoreError::MalformedEvent(_)) {
        StatusCode::BAD_REQUEST
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = if status.is_server_error() {
            error!(error = ?self.0, "Request failed");
            "Internal server error".to_string()
        } else {
            warn!(status = status.as_u16(), error = %self.0, "Request refused");
            match self.0.downcast_ref::<BusinessError>() {
                Some(err) => err.to_string(),
                None => self.0.to_string(),
            }
        };
        (status, ApiResponse::error(message)).into_response()
    }
}

pub type ApiResult<T> = Result<Json<ApiResponse<T>>, ApiError>;

// ============ Caller identity ============

/// Identity của caller, đọc từ header do session middleware phía trước gắn vào.
/// Header thiếu hoặc rỗng ⇒ anonymous.
#[derive(Debug, Clone, Default)]
pub struct Caller(pub Option<String>);

impl Caller {
    pub fn id(&self) -> Option<&str> {
        self.0.as_deref()
    }
}

#[async_trait]
impl FromRequestParts<AppState> for Caller {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let id = parts
            .headers
            .get(&state.identity_header)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string);
        Ok(Caller(id))
    }
}

// ============ Request Types ============

#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    pub full_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UsersQuery {
    pub status: Option<String>,
    pub page: Option<String>,
    pub limit: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateAppRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub url: Option<String>,
    pub category: Option<String>,
    pub icon_url: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecideRequest {
    pub request_id: Option<String>,
    pub user_id: Option<String>,
    pub action: Option<String>,
    pub notes: Option<String>,
}

// ============ Handlers ============

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let timestamp = Utc::now().to_rfc3339();
    match gatehouse_persistence::ping(state.ctx.pool()).await {
        Ok(()) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "status": "healthy",
                "database": "connected",
                "timestamp": timestamp,
            })),
        ),
        Err(e) => {
            error!(error = %e, "Database health check failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({
                    "status": "unhealthy",
                    "database": "error",
                    "timestamp": timestamp,
                })),
            )
        }
    }
}

/// Profile của caller
pub async fn get_profile(
    State(state): State<AppState>,
    caller: Caller,
) -> ApiResult<gatehouse_core::UserProfile> {
    let profile = ProfileService::new(&state.ctx).get(caller.id()).await?;
    Ok(ApiResponse::success(profile))
}

/// Đổi tên hiển thị của caller
pub async fn update_profile(
    State(state): State<AppState>,
    caller: Caller,
    Json(payload): Json<UpdateProfileRequest>,
) -> ApiResult<gatehouse_core::UserProfile> {
    let profile = ProfileService::new(&state.ctx)
        .update_full_name(caller.id(), payload.full_name.as_deref())
        .await?;
    Ok(ApiResponse::success(profile))
}

/// Apps của caller (rỗng nếu chưa APPROVED)
pub async fn list_user_apps(
    State(state): State<AppState>,
    caller: Caller,
) -> ApiResult<Vec<gatehouse_core::UserApp>> {
    let user_id = gatehouse_business::require_caller(caller.id())?;
    let apps = CatalogService::new(&state.ctx).user_apps(user_id).await?;
    Ok(ApiResponse::success(apps))
}

/// Admin: danh sách users
pub async fn list_users(
    State(state): State<AppState>,
    caller: Caller,
    Query(query): Query<UsersQuery>,
) -> ApiResult<gatehouse_business::UserPage> {
    require_admin(caller.id(), &state.ctx).await?;

    // Số không hợp lệ được coi như không truyền
    let query = DirectoryQuery {
        status: query.status,
        page: query.page.and_then(|p| p.trim().parse().ok()),
        limit: query.limit.and_then(|l| l.trim().parse().ok()),
    };
    let page = DirectoryService::new(&state.ctx).list_users(&query).await?;
    Ok(ApiResponse::success(page))
}

/// Admin: thống kê portal
pub async fn admin_stats(
    State(state): State<AppState>,
    caller: Caller,
) -> ApiResult<gatehouse_business::PortalStats> {
    require_admin(caller.id(), &state.ctx).await?;
    let stats = DirectoryService::new(&state.ctx).stats().await?;
    Ok(ApiResponse::success(stats))
}

/// Admin: toàn bộ catalog
pub async fn list_apps(
    State(state): State<AppState>,
    caller: Caller,
) -> ApiResult<Vec<gatehouse_core::CatalogEntry>> {
    require_admin(caller.id(), &state.ctx).await?;
    let apps = CatalogService::new(&state.ctx).list_all().await?;
    Ok(ApiResponse::success(apps))
}

/// Admin: thêm app vào catalog
pub async fn create_app(
    State(state): State<AppState>,
    caller: Caller,
    Json(payload): Json<CreateAppRequest>,
) -> Result<(StatusCode, Json<ApiResponse<gatehouse_core::CatalogEntry>>), ApiError> {
    require_admin(caller.id(), &state.ctx).await?;

    let input = NewCatalogEntry::parse(
        payload.name.as_deref(),
        payload.description.as_deref(),
        payload.url.as_deref(),
        payload.category.as_deref(),
        payload.icon_url.as_deref(),
    )
    .map_err(BusinessError::from)?;

    let entry = CatalogService::new(&state.ctx).create(input).await?;
    Ok((StatusCode::CREATED, ApiResponse::success(entry)))
}

/// Admin: approve / reject một approval request
pub async fn approve_user(
    State(state): State<AppState>,
    caller: Caller,
    Json(payload): Json<DecideRequest>,
) -> ApiResult<gatehouse_business::DecisionOutcome> {
    let admin = require_admin(caller.id(), &state.ctx).await?;

    let command = DecideCommand::parse(
        payload.request_id.as_deref(),
        payload.user_id.as_deref(),
        payload.action.as_deref(),
        payload.notes.as_deref(),
    )
    .map_err(BusinessError::from)?;

    let outcome = ApprovalEngine::new(&state.ctx)
        .decide(&admin.id, &command)
        .await?;
    Ok(ApiResponse::success(outcome))
}

/// Webhook từ identity provider. Body được giữ nguyên để verify chữ ký.
pub async fn identity_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<StatusCode, ApiError> {
    let Some(verifier) = state.verifier.as_deref() else {
        return Err(BusinessError::WebhookMisconfigured(
            "IDENTITY_WEBHOOK_SECRET is not set".to_string(),
        )
        .into());
    };

    let header = |name: &str| headers.get(name).and_then(|v| v.to_str().ok());
    let webhook_headers = WebhookHeaders::new(
        header(SVIX_ID),
        header(SVIX_TIMESTAMP),
        header(SVIX_SIGNATURE),
    );

    let outcome = OnboardingService::new(&state.ctx)
        .ingest(verifier, &webhook_headers, &body)
        .await?;

    if let Some(seed) = outcome {
        info!(
            profile_created = seed.profile_created,
            request_created = seed.request_created,
            "Identity webhook processed"
        );
    }
    Ok(StatusCode::OK)
}
