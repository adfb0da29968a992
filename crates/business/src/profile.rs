//! Profile Service - users read and edit their own profile

use crate::access::require_caller;
use crate::error::{BusinessError, BusinessResult};
use crate::services::ServiceContext;
use anyhow::Context;
use gatehouse_core::UserProfile;
use gatehouse_persistence::ProfileRepo;
use tracing::info;

/// Profile Service
pub struct ProfileService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> ProfileService<'a> {
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// The caller's profile
    pub async fn get(&self, caller: Option<&str>) -> BusinessResult<UserProfile> {
        let user_id = require_caller(caller)?;
        let row = ProfileRepo::find_by_id(self.ctx.pool(), user_id)
            .await
            .context("Failed to fetch profile")?
            .ok_or_else(|| BusinessError::not_found("UserProfile", user_id))?;
        Ok(UserProfile::try_from(row).map_err(BusinessError::from)?)
    }

    /// Change the display name. The name is trimmed and must not be empty.
    pub async fn update_full_name(
        &self,
        caller: Option<&str>,
        full_name: Option<&str>,
    ) -> BusinessResult<UserProfile> {
        let user_id = require_caller(caller)?;
        let full_name = full_name
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .ok_or_else(|| BusinessError::Validation("Full name is required".to_string()))?;

        let row = match ProfileRepo::update_full_name(self.ctx.pool(), user_id, full_name).await {
            Ok(row) => row,
            Err(e) if e.is_not_found() => {
                return Err(BusinessError::not_found("UserProfile", user_id).into())
            }
            Err(e) => return Err(anyhow::Error::from(e).context("Failed to update profile")),
        };

        info!(user_id, "Profile name updated");
        Ok(UserProfile::try_from(row).map_err(BusinessError::from)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::testing::{context, seed_pending_user};
    use gatehouse_core::AccessStatus;

    #[tokio::test]
    async fn test_get_own_profile() {
        let ctx = context().await;
        seed_pending_user(&ctx, "u1").await;

        let profile = ProfileService::new(&ctx).get(Some("u1")).await.unwrap();
        assert_eq!(profile.id, "u1");
        assert_eq!(profile.status, AccessStatus::Pending);
    }

    #[tokio::test]
    async fn test_get_requires_caller() {
        let ctx = context().await;
        let err = ProfileService::new(&ctx).get(None).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<BusinessError>(),
            Some(BusinessError::Unauthenticated)
        ));

        let err = ProfileService::new(&ctx).get(Some("ghost")).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<BusinessError>(),
            Some(BusinessError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_update_full_name_trims() {
        let ctx = context().await;
        seed_pending_user(&ctx, "u1").await;

        let profile = ProfileService::new(&ctx)
            .update_full_name(Some("u1"), Some("  Ada Lovelace  "))
            .await
            .unwrap();
        assert_eq!(profile.full_name, "Ada Lovelace");
    }

    #[tokio::test]
    async fn test_update_full_name_rejects_blank() {
        let ctx = context().await;
        seed_pending_user(&ctx, "u1").await;
        let service = ProfileService::new(&ctx);

        for name in [None, Some(""), Some("   ")] {
            let err = service.update_full_name(Some("u1"), name).await.unwrap_err();
            assert!(matches!(
                err.downcast_ref::<BusinessError>(),
                Some(BusinessError::Validation(_))
            ));
        }
    }
}
