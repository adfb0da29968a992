//! Admin capability check
//!
//! A pure decision over the caller's identity and a profile lookup. No
//! process-wide state: the lookup is passed in by the caller.

use crate::error::{BusinessError, BusinessResult};
use crate::services::ServiceContext;
use async_trait::async_trait;
use gatehouse_core::UserProfile;
use gatehouse_persistence::ProfileRepo;
use tracing::warn;

/// Read access to profiles by identity key
#[async_trait]
pub trait ProfileLookup: Send + Sync {
    async fn lookup_profile(&self, user_id: &str) -> BusinessResult<Option<UserProfile>>;
}

#[async_trait]
impl ProfileLookup for ServiceContext {
    async fn lookup_profile(&self, user_id: &str) -> BusinessResult<Option<UserProfile>> {
        let row = ProfileRepo::find_by_id(self.pool(), user_id)
            .await
            .map_err(BusinessError::from)?;
        match row {
            Some(row) => Ok(Some(UserProfile::try_from(row).map_err(BusinessError::from)?)),
            None => Ok(None),
        }
    }
}

/// Result of the admin capability check
#[derive(Debug, Clone)]
pub struct AdminAccess {
    pub is_admin: bool,
    pub profile: Option<UserProfile>,
}

impl AdminAccess {
    fn denied(profile: Option<UserProfile>) -> Self {
        Self {
            is_admin: false,
            profile,
        }
    }
}

/// Decide whether `caller` holds admin capability.
///
/// Anonymous callers, unknown identities and failed lookups are all non-admin.
pub async fn check_admin_access<L>(caller: Option<&str>, lookup: &L) -> AdminAccess
where
    L: ProfileLookup + ?Sized,
{
    let Some(user_id) = caller.filter(|id| !id.is_empty()) else {
        return AdminAccess::denied(None);
    };

    match lookup.lookup_profile(user_id).await {
        Ok(Some(profile)) => AdminAccess {
            is_admin: profile.is_admin(),
            profile: Some(profile),
        },
        Ok(None) => AdminAccess::denied(None),
        Err(e) => {
            warn!(user_id, error = %e, "Profile lookup failed during admin check");
            AdminAccess::denied(None)
        }
    }
}

/// Like [`check_admin_access`] but refuses non-admins with `Forbidden`
pub async fn require_admin<L>(caller: Option<&str>, lookup: &L) -> BusinessResult<UserProfile>
where
    L: ProfileLookup + ?Sized,
{
    let access = check_admin_access(caller, lookup).await;
    match access.profile {
        Some(profile) if access.is_admin => Ok(profile),
        _ => {
            warn!(caller = caller.unwrap_or("anonymous"), "Admin access refused");
            Err(BusinessError::forbidden(caller).into())
        }
    }
}

/// Authenticated caller id, or `Unauthenticated`
pub fn require_caller(caller: Option<&str>) -> Result<&str, BusinessError> {
    caller
        .filter(|id| !id.is_empty())
        .ok_or(BusinessError::Unauthenticated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use gatehouse_core::Role;
    use std::collections::HashMap;

    struct StaticProfiles(HashMap<String, UserProfile>);

    #[async_trait]
    impl ProfileLookup for StaticProfiles {
        async fn lookup_profile(&self, user_id: &str) -> BusinessResult<Option<UserProfile>> {
            Ok(self.0.get(user_id).cloned())
        }
    }

    struct BrokenLookup;

    #[async_trait]
    impl ProfileLookup for BrokenLookup {
        async fn lookup_profile(&self, _user_id: &str) -> BusinessResult<Option<UserProfile>> {
            Err(anyhow::anyhow!("store unavailable"))
        }
    }

    fn profiles() -> StaticProfiles {
        let mut admin = UserProfile::pending("admin_1", "admin@example.com", "Admin");
        admin.role = Role::Admin;
        let user = UserProfile::pending("user_1", "user@example.com", "User");

        StaticProfiles(HashMap::from([
            (admin.id.clone(), admin),
            (user.id.clone(), user),
        ]))
    }

    #[tokio::test]
    async fn test_admin_is_granted() {
        let access = check_admin_access(Some("admin_1"), &profiles()).await;
        assert!(access.is_admin);
        assert_eq!(access.profile.unwrap().id, "admin_1");
    }

    #[tokio::test]
    async fn test_regular_user_is_refused() {
        let access = check_admin_access(Some("user_1"), &profiles()).await;
        assert!(!access.is_admin);
        assert!(access.profile.is_some());

        let err = require_admin(Some("user_1"), &profiles()).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<BusinessError>(),
            Some(BusinessError::Forbidden { .. })
        ));
    }

    #[tokio::test]
    async fn test_anonymous_and_unknown_are_refused() {
        assert!(!check_admin_access(None, &profiles()).await.is_admin);
        assert!(!check_admin_access(Some(""), &profiles()).await.is_admin);
        assert!(!check_admin_access(Some("ghost"), &profiles()).await.is_admin);
    }

    #[tokio::test]
    async fn test_lookup_failure_is_refused() {
        let access = check_admin_access(Some("admin_1"), &BrokenLookup).await;
        assert!(!access.is_admin);
    }

    #[test]
    fn test_require_caller() {
        assert_eq!(require_caller(Some("user_1")).unwrap(), "user_1");
        assert!(matches!(
            require_caller(None),
            Err(BusinessError::Unauthenticated)
        ));
        assert!(matches!(
            require_caller(Some("")),
            Err(BusinessError::Unauthenticated)
        ));
    }

    #[tokio::test]
    async fn test_store_backed_lookup() {
        use crate::services::testing::{context, seed_admin, seed_pending_user};

        let ctx = context().await;
        seed_admin(&ctx, "admin_1").await;
        seed_pending_user(&ctx, "user_1").await;

        let admin = require_admin(Some("admin_1"), &ctx).await.unwrap();
        assert!(admin.is_admin());
        assert!(!check_admin_access(Some("user_1"), &ctx).await.is_admin);
    }
}
