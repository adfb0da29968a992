//! # Error Module
//!
//! Domain errors cho Gatehouse sử dụng thiserror.

use crate::status::AccessStatus;
use thiserror::Error;

/// Core domain errors.
///
/// Các lỗi nghiệp vụ cốt lõi, không liên quan đến infrastructure.
#[derive(Debug, Error)]
pub enum CoreError {
    // === State machine errors ===
    #[error("Request already decided: {0}")]
    AlreadyDecided(AccessStatus),

    #[error("Invalid decision: {0}")]
    InvalidDecision(String),

    // === Validation errors ===
    #[error("Missing required field: {0}")]
    MissingField(String),

    // === Identity event errors ===
    #[error("Malformed identity event: {0}")]
    MalformedEvent(String),
}

/// Result type alias với CoreError
pub type CoreResult<T> = Result<T, CoreError>;

impl CoreError {
    pub fn missing(field: &str) -> Self {
        CoreError::MissingField(field.to_string())
    }

    /// Kiểm tra có phải lỗi input từ caller không
    pub fn is_validation_error(&self) -> bool {
        matches!(
            self,
            CoreError::MissingField(_) | CoreError::InvalidDecision(_)
        )
    }
}
