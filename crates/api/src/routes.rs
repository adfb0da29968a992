//! API Routes

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;

pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Health check
        .route("/api/health", get(handlers::health_check))
        // User routes
        .route(
            "/api/user/profile",
            get(handlers::get_profile).put(handlers::update_profile),
        )
        .route("/api/user/apps", get(handlers::list_user_apps))
        // Admin routes
        .route("/api/admin/users", get(handlers::list_users))
        .route("/api/admin/stats", get(handlers::admin_stats))
        .route(
            "/api/admin/apps",
            get(handlers::list_apps).post(handlers::create_app),
        )
        .route("/api/admin/approve-user", post(handlers::approve_user))
        // Identity provider
        .route("/api/webhooks/identity", post(handlers::identity_webhook))
        // Middleware
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GatehouseConfig;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use chrono::Utc;
    use gatehouse_business::{ServiceContext, WebhookVerifier};
    use gatehouse_core::{ApprovalRequest, CatalogEntry, Role, UserProfile};
    use gatehouse_persistence::{
        init_memory_database, ApprovalRequestRepo, CatalogRepo, GrantRepo, ProfileRepo,
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    const SECRET: &str = "whsec_c2VjcmV0LW9uZQ==";

    async fn setup() -> (Router, ServiceContext) {
        let ctx = ServiceContext::from_pool(init_memory_database().await.unwrap());
        let config = GatehouseConfig {
            webhook_secret: Some(SECRET.to_string()),
            ..Default::default()
        };
        let state = AppState::new(ctx.clone(), &config).unwrap();
        (create_router(state), ctx)
    }

    async fn seed_user(ctx: &ServiceContext, id: &str, role: Role) -> String {
        let profile = UserProfile::pending(id, &format!("{}@example.com", id), id);
        ProfileRepo::insert_if_absent(ctx.pool(), &profile).await.unwrap();
        ProfileRepo::set_role(ctx.pool(), id, role).await.unwrap();
        let request_id = format!("req_{}", id);
        ApprovalRequestRepo::insert_if_absent(ctx.pool(), &ApprovalRequest::pending(&request_id, id))
            .await
            .unwrap();
        request_id
    }

    async fn seed_app(ctx: &ServiceContext, id: &str, is_active: bool) {
        let entry = CatalogEntry {
            id: id.to_string(),
            name: format!("App {}", id),
            description: "test".to_string(),
            url: format!("https://{}.example.com", id),
            icon_url: None,
            category: "general".to_string(),
            is_active,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        CatalogRepo::insert(ctx.pool(), &entry).await.unwrap();
    }

    fn request(method: &str, uri: &str, caller: Option<&str>, body: Option<Value>) -> Request<Body> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(caller) = caller {
            builder = builder.header("x-user-id", caller);
        }
        match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        }
    }

    async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
        let response = app.clone().oneshot(req).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    fn webhook(body: &str, signature: Option<String>) -> Request<Body> {
        let verifier = WebhookVerifier::new(SECRET, 300).unwrap();
        let ts = Utc::now().timestamp();
        let signature =
            signature.unwrap_or_else(|| verifier.sign("msg_1", ts, body.as_bytes()).unwrap());
        Request::builder()
            .method("POST")
            .uri("/api/webhooks/identity")
            .header("svix-id", "msg_1")
            .header("svix-timestamp", ts.to_string())
            .header("svix-signature", signature)
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let (app, _) = setup().await;
        let (status, body) = send(&app, request("GET", "/api/health", None, None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["database"], "connected");
    }

    #[tokio::test]
    async fn test_profile_requires_identity() {
        let (app, ctx) = setup().await;
        seed_user(&ctx, "u1", Role::User).await;

        let (status, body) = send(&app, request("GET", "/api/user/profile", None, None)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["success"], false);

        let (status, body) = send(&app, request("GET", "/api/user/profile", Some("u1"), None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["status"], "PENDING");
    }

    #[tokio::test]
    async fn test_update_profile() {
        let (app, ctx) = setup().await;
        seed_user(&ctx, "u1", Role::User).await;

        let (status, body) = send(
            &app,
            request("PUT", "/api/user/profile", Some("u1"), Some(json!({"full_name": "  Ada "}))),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["full_name"], "Ada");

        let (status, _) = send(
            &app,
            request("PUT", "/api/user/profile", Some("u1"), Some(json!({"full_name": " "}))),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_admin_routes_refuse_non_admins() {
        let (app, ctx) = setup().await;
        seed_user(&ctx, "u1", Role::User).await;

        for uri in ["/api/admin/users", "/api/admin/stats", "/api/admin/apps"] {
            let (status, _) = send(&app, request("GET", uri, Some("u1"), None)).await;
            assert_eq!(status, StatusCode::FORBIDDEN, "{}", uri);
            let (status, _) = send(&app, request("GET", uri, None, None)).await;
            assert_eq!(status, StatusCode::FORBIDDEN, "{}", uri);
        }

        let (status, _) = send(
            &app,
            request(
                "POST",
                "/api/admin/approve-user",
                Some("u1"),
                Some(json!({"requestId": "req_u1", "userId": "u1", "action": "approve"})),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        let profile = ProfileRepo::get_by_id(ctx.pool(), "u1").await.unwrap();
        assert_eq!(profile.status, "PENDING");
    }

    #[tokio::test]
    async fn test_approve_flow_grants_apps() {
        let (app, ctx) = setup().await;
        seed_user(&ctx, "admin", Role::Admin).await;
        let request_id = seed_user(&ctx, "u1", Role::User).await;
        seed_app(&ctx, "a1", true).await;
        seed_app(&ctx, "a2", true).await;

        let (status, body) = send(&app, request("GET", "/api/user/apps", Some("u1"), None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"], json!([]));

        let (status, body) = send(
            &app,
            request(
                "POST",
                "/api/admin/approve-user",
                Some("admin"),
                Some(json!({"requestId": request_id, "userId": "u1", "action": "approve"})),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["decided"], true);
        assert_eq!(body["data"]["status"], "APPROVED");
        assert_eq!(body["data"]["grants"]["state"], "applied");
        assert_eq!(body["data"]["grants"]["granted"], 2);

        let (_, body) = send(&app, request("GET", "/api/user/apps", Some("u1"), None)).await;
        let apps = body["data"].as_array().unwrap();
        assert_eq!(apps.len(), 2);
        assert_eq!(apps[0]["app"]["name"], "App a1");

        // Quyết định lần hai bị từ chối
        let (status, _) = send(
            &app,
            request(
                "POST",
                "/api/admin/approve-user",
                Some("admin"),
                Some(json!({"requestId": request_id, "userId": "u1", "action": "reject"})),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_approve_validation() {
        let (app, ctx) = setup().await;
        seed_user(&ctx, "admin", Role::Admin).await;
        seed_user(&ctx, "u1", Role::User).await;

        let (status, _) = send(
            &app,
            request(
                "POST",
                "/api/admin/approve-user",
                Some("admin"),
                Some(json!({"userId": "u1", "action": "approve"})),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = send(
            &app,
            request(
                "POST",
                "/api/admin/approve-user",
                Some("admin"),
                Some(json!({"requestId": "req_u1", "userId": "u1", "action": "maybe"})),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = send(
            &app,
            request(
                "POST",
                "/api/admin/approve-user",
                Some("admin"),
                Some(json!({"requestId": "req_nope", "userId": "u1", "action": "approve"})),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_reject_with_notes() {
        let (app, ctx) = setup().await;
        seed_user(&ctx, "admin", Role::Admin).await;
        let request_id = seed_user(&ctx, "u2", Role::User).await;
        seed_app(&ctx, "a1", true).await;

        let (status, body) = send(
            &app,
            request(
                "POST",
                "/api/admin/approve-user",
                Some("admin"),
                Some(json!({
                    "requestId": request_id,
                    "userId": "u2",
                    "action": "reject",
                    "notes": "incomplete profile"
                })),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["grants"]["state"], "not_applicable");

        let request = ApprovalRequestRepo::find_by_user(ctx.pool(), "u2")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(request.admin_notes.as_deref(), Some("incomplete profile"));
        assert!(GrantRepo::list_for_user(ctx.pool(), "u2")
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_admin_catalog_and_directory() {
        let (app, ctx) = setup().await;
        seed_user(&ctx, "admin", Role::Admin).await;
        seed_user(&ctx, "u1", Role::User).await;

        let (status, body) = send(
            &app,
            request(
                "POST",
                "/api/admin/apps",
                Some("admin"),
                Some(json!({"name": "Wiki", "description": "Team wiki", "url": "https://wiki"})),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["data"]["category"], "general");
        assert_eq!(body["data"]["is_active"], true);

        let (status, _) = send(
            &app,
            request("POST", "/api/admin/apps", Some("admin"), Some(json!({"name": "No url"}))),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (_, body) = send(&app, request("GET", "/api/admin/apps", Some("admin"), None)).await;
        assert_eq!(body["data"].as_array().unwrap().len(), 1);

        let (status, body) = send(
            &app,
            request("GET", "/api/admin/users?status=PENDING&limit=1", Some("admin"), None),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["users"].as_array().unwrap().len(), 1);
        assert_eq!(body["data"]["pagination"]["total"], 2);
        assert_eq!(body["data"]["pagination"]["total_pages"], 2);

        let (_, body) = send(&app, request("GET", "/api/admin/stats", Some("admin"), None)).await;
        assert_eq!(body["data"]["users"]["total"], 2);
        assert_eq!(body["data"]["apps"]["active"], 1);
    }

    #[tokio::test]
    async fn test_webhook_seeds_pending_user() {
        let (app, ctx) = setup().await;
        let body = r#"{"type":"user.created","data":{"id":"user_7","email_addresses":[{"email_address":"seven@example.com"}],"first_name":"Ada","last_name":"Lovelace"}}"#;

        let (status, _) = send(&app, webhook(body, None)).await;
        assert_eq!(status, StatusCode::OK);
        // Delivery lặp lại vẫn được ack
        let (status, _) = send(&app, webhook(body, None)).await;
        assert_eq!(status, StatusCode::OK);

        let profile = ProfileRepo::get_by_id(ctx.pool(), "user_7").await.unwrap();
        assert_eq!(profile.full_name, "Ada Lovelace");
        assert_eq!(profile.status, "PENDING");
        let request = ApprovalRequestRepo::find_by_user(ctx.pool(), "user_7")
            .await
            .unwrap();
        assert!(request.is_some());
    }

    #[tokio::test]
    async fn test_webhook_rejects_bad_or_missing_signature() {
        let (app, ctx) = setup().await;
        let body = r#"{"type":"user.created","data":{"id":"user_7","email_addresses":[{"email_address":"seven@example.com"}]}}"#;

        let (status, _) = send(&app, webhook(body, Some("v1,AAAA".to_string()))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let req = Request::builder()
            .method("POST")
            .uri("/api/webhooks/identity")
            .body(Body::from(body))
            .unwrap();
        let (status, _) = send(&app, req).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        assert!(ProfileRepo::find_by_id(ctx.pool(), "user_7")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_webhook_store_failure_asks_for_retry() {
        let (app, ctx) = setup().await;
        sqlx::query("DROP TABLE approval_requests")
            .execute(ctx.pool())
            .await
            .unwrap();
        let body = r#"{"type":"user.created","data":{"id":"user_8","email_addresses":[{"email_address":"eight@example.com"}],"first_name":"Ada"}}"#;

        let (status, body) = send(&app, webhook(body, None)).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["success"], false);

        assert!(ProfileRepo::find_by_id(ctx.pool(), "user_8")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_admin_directory_huge_page_is_empty() {
        let (app, ctx) = setup().await;
        seed_user(&ctx, "admin", Role::Admin).await;

        let (status, body) = send(
            &app,
            request(
                "GET",
                &format!("/api/admin/users?page={}", i64::MAX),
                Some("admin"),
                None,
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["users"], json!([]));
        assert_eq!(body["data"]["pagination"]["total"], 1);
    }

    #[tokio::test]
    async fn test_webhook_without_secret_is_server_error() {
        let ctx = ServiceContext::from_pool(init_memory_database().await.unwrap());
        let state = AppState::new(ctx, &GatehouseConfig::default()).unwrap();
        let app = create_router(state);

        let (status, _) = send(&app, webhook(r#"{"type":"user.created"}"#, None)).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    }
}
