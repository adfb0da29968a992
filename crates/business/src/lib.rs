//! # Gatehouse Business
//!
//! Business logic layer - approval engine, identity provider onboarding,
//! catalog access and the admin directory.

pub mod access;
pub mod admin;
pub mod approval;
pub mod catalog;
pub mod error;
pub mod onboarding;
pub mod profile;
pub mod services;
pub mod webhook;

pub use access::{check_admin_access, require_admin, require_caller, AdminAccess, ProfileLookup};
pub use admin::{
    AppStats, DirectoryEntry, DirectoryQuery, DirectoryService, Pagination, PortalStats, UserPage,
    UserStats,
};
pub use approval::{ApprovalEngine, DecideCommand, DecisionOutcome, GrantOutcome};
pub use catalog::CatalogService;
pub use error::{BusinessError, BusinessResult};
pub use onboarding::{OnboardingService, SeedOutcome};
pub use profile::ProfileService;
pub use services::ServiceContext;
pub use webhook::{WebhookHeaders, WebhookVerifier};
