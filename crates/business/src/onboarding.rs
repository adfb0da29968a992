//! Onboarding Service - seeds profile + approval request from the identity provider
//!
//! Each `user.created` creates exactly one `UserProfile` (PENDING, role user)
//! and one `ApprovalRequest` (PENDING). Redelivery creates no extra rows.

use crate::error::{BusinessError, BusinessResult};
use crate::services::ServiceContext;
use crate::webhook::{WebhookHeaders, WebhookVerifier};
use anyhow::Context;
use gatehouse_core::{ApprovalRequest, CoreError, IdentityEvent, NewIdentity, UserProfile};
use gatehouse_persistence::{ApprovalRequestRepo, ProfileRepo};
use serde::Serialize;
use tracing::{debug, info};
use uuid::Uuid;

/// Which rows this seed created
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SeedOutcome {
    pub profile_created: bool,
    pub request_created: bool,
}

impl SeedOutcome {
    /// Both rows already existed (redelivery)
    pub fn is_duplicate(&self) -> bool {
        !self.profile_created && !self.request_created
    }
}

/// Onboarding Service
pub struct OnboardingService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> OnboardingService<'a> {
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Seed profile + request for a new identity in one transaction
    pub async fn register(&self, identity: &NewIdentity) -> BusinessResult<SeedOutcome> {
        let profile = UserProfile::pending(&identity.id, &identity.email, &identity.full_name);
        let request_id = format!("req_{}", Uuid::new_v4().simple());
        let request = ApprovalRequest::pending(&request_id, &identity.id);

        let mut tx = self.ctx.pool().begin().await?;

        let profile_created = ProfileRepo::insert_if_absent(&mut *tx, &profile)
            .await
            .context("Failed to insert user profile")?;
        let request_created = ApprovalRequestRepo::insert_if_absent(&mut *tx, &request)
            .await
            .context("Failed to insert approval request")?;

        tx.commit().await.context("Failed to commit onboarding")?;

        let outcome = SeedOutcome {
            profile_created,
            request_created,
        };
        if outcome.is_duplicate() {
            debug!(user_id = %identity.id, "Identity already onboarded");
        } else {
            info!(user_id = %identity.id, email = %identity.email, "User onboarded as PENDING");
        }
        Ok(outcome)
    }

    /// Verify, parse and seed one webhook delivery.
    ///
    /// Returns `None` for events other than `user.created`.
    pub async fn ingest(
        &self,
        verifier: &WebhookVerifier,
        headers: &WebhookHeaders,
        payload: &[u8],
    ) -> BusinessResult<Option<SeedOutcome>> {
        verifier.verify(headers, payload)?;

        let event = IdentityEvent::parse(payload).map_err(malformed)?;
        let Some(identity) = event.new_identity().map_err(malformed)? else {
            debug!(event_type = %event.event_type, "Ignoring identity event");
            return Ok(None);
        };

        self.register(&identity).await.map(Some)
    }
}

fn malformed(err: CoreError) -> BusinessError {
    match err {
        CoreError::MalformedEvent(msg) => BusinessError::MalformedEvent(msg),
        other => BusinessError::Core(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::testing::context;
    use chrono::Utc;

    const SECRET: &str = "whsec_c2VjcmV0LW9uZQ==";

    fn identity(id: &str) -> NewIdentity {
        NewIdentity {
            id: id.to_string(),
            email: format!("{}@example.com", id),
            full_name: "Ada Lovelace".to_string(),
        }
    }

    fn delivery(verifier: &WebhookVerifier, body: &[u8]) -> WebhookHeaders {
        let ts = Utc::now().timestamp();
        let sig = verifier.sign("msg_1", ts, body).unwrap();
        WebhookHeaders::new(Some("msg_1"), Some(&ts.to_string()), Some(&sig))
    }

    #[tokio::test]
    async fn test_register_seeds_pending_profile_and_request() {
        let ctx = context().await;
        let outcome = OnboardingService::new(&ctx)
            .register(&identity("user_1"))
            .await
            .unwrap();

        assert!(outcome.profile_created && outcome.request_created);

        let profile = ProfileRepo::get_by_id(ctx.pool(), "user_1").await.unwrap();
        assert_eq!(profile.status, "PENDING");
        assert_eq!(profile.role, "user");
        assert_eq!(profile.full_name, "Ada Lovelace");

        let request = ApprovalRequestRepo::find_by_user(ctx.pool(), "user_1")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(request.status, "PENDING");
        assert!(request.id.starts_with("req_"));
    }

    #[tokio::test]
    async fn test_register_is_idempotent() {
        let ctx = context().await;
        let service = OnboardingService::new(&ctx);
        service.register(&identity("user_1")).await.unwrap();

        let again = service.register(&identity("user_1")).await.unwrap();
        assert!(again.is_duplicate());

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM approval_requests")
            .fetch_one(ctx.pool())
            .await
            .unwrap();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn test_register_store_failure_seeds_nothing() {
        let ctx = context().await;
        sqlx::query("DROP TABLE approval_requests")
            .execute(ctx.pool())
            .await
            .unwrap();

        let result = OnboardingService::new(&ctx)
            .register(&identity("user_1"))
            .await;

        assert!(result.is_err());
        assert!(ProfileRepo::find_by_id(ctx.pool(), "user_1")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_ingest_user_created() {
        let ctx = context().await;
        let verifier = WebhookVerifier::new(SECRET, 300).unwrap();
        let body = br#"{"type":"user.created","data":{"id":"user_9","email_addresses":[{"email_address":"nine@example.com"}],"first_name":"Grace","last_name":null}}"#;

        let outcome = OnboardingService::new(&ctx)
            .ingest(&verifier, &delivery(&verifier, body), body)
            .await
            .unwrap();

        assert_eq!(
            outcome,
            Some(SeedOutcome {
                profile_created: true,
                request_created: true
            })
        );
        let profile = ProfileRepo::get_by_id(ctx.pool(), "user_9").await.unwrap();
        assert_eq!(profile.full_name, "Grace");
        assert_eq!(profile.email, "nine@example.com");
    }

    #[tokio::test]
    async fn test_ingest_ignores_other_events() {
        let ctx = context().await;
        let verifier = WebhookVerifier::new(SECRET, 300).unwrap();
        let body = br#"{"type":"user.updated","data":{"id":"user_9"}}"#;

        let outcome = OnboardingService::new(&ctx)
            .ingest(&verifier, &delivery(&verifier, body), body)
            .await
            .unwrap();
        assert!(outcome.is_none());
        assert!(ProfileRepo::find_by_id(ctx.pool(), "user_9")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_ingest_rejects_bad_signature_before_parsing() {
        let ctx = context().await;
        let verifier = WebhookVerifier::new(SECRET, 300).unwrap();
        let body = b"not even json";
        let mut headers = delivery(&verifier, body);
        headers.signature = Some("v1,AAAA".to_string());

        let err = OnboardingService::new(&ctx)
            .ingest(&verifier, &headers, body)
            .await
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<BusinessError>(),
            Some(BusinessError::InvalidSignature(_))
        ));
    }

    #[tokio::test]
    async fn test_ingest_malformed_user_created() {
        let ctx = context().await;
        let verifier = WebhookVerifier::new(SECRET, 300).unwrap();
        let body = br#"{"type":"user.created","data":{"id":"user_9","email_addresses":[]}}"#;

        let err = OnboardingService::new(&ctx)
            .ingest(&verifier, &delivery(&verifier, body), body)
            .await
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<BusinessError>(),
            Some(BusinessError::MalformedEvent(_))
        ));
    }
}
