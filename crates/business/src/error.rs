//! Business layer errors
//!
//! Uses anyhow for error aggregation with custom error types.

use gatehouse_core::AccessStatus;
use thiserror::Error;

/// Business operation errors
#[derive(Debug, Error)]
pub enum BusinessError {
    // === Caller errors ===
    #[error("Authentication required")]
    Unauthenticated,

    #[error("Admin capability required (caller: {caller})")]
    Forbidden { caller: String },

    #[error("Validation failed: {0}")]
    Validation(String),

    // === Not found errors ===
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    // === State machine errors ===
    #[error("Approval request {request_id} already decided: {status}")]
    AlreadyDecided {
        request_id: String,
        status: AccessStatus,
    },

    // === Webhook errors ===
    #[error("Missing webhook signature headers")]
    MissingSignatureHeaders,

    #[error("Invalid webhook signature: {0}")]
    InvalidSignature(String),

    #[error("Webhook secret not configured or invalid: {0}")]
    WebhookMisconfigured(String),

    #[error("Malformed identity event: {0}")]
    MalformedEvent(String),

    // === Wrapped errors ===
    #[error("Persistence error: {0}")]
    Persistence(#[from] gatehouse_persistence::PersistenceError),

    #[error("Core error: {0}")]
    Core(#[from] gatehouse_core::CoreError),
}

/// Result type alias for business operations
pub type BusinessResult<T> = anyhow::Result<T>;

impl BusinessError {
    pub fn forbidden(caller: Option<&str>) -> Self {
        Self::Forbidden {
            caller: caller.unwrap_or("anonymous").to_string(),
        }
    }

    pub fn not_found(entity: &str, id: &str) -> Self {
        Self::NotFound {
            entity: entity.to_string(),
            id: id.to_string(),
        }
    }

    /// Errors caused by caller input rather than the system
    pub fn is_client_error(&self) -> bool {
        match self {
            Self::Persistence(_) | Self::WebhookMisconfigured(_) => false,
            Self::Core(err) => err.is_validation_error(),
            _ => true,
        }
    }
}
