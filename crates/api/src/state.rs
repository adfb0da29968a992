//! Application state

use crate::config::GatehouseConfig;
use axum::http::HeaderName;
use gatehouse_business::{BusinessError, ServiceContext, WebhookVerifier};
use std::sync::Arc;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub ctx: ServiceContext,
    /// `None` khi chưa cấu hình secret; webhook khi đó trả về 500
    pub verifier: Option<Arc<WebhookVerifier>>,
    pub identity_header: HeaderName,
}

impl AppState {
    pub fn new(ctx: ServiceContext, config: &GatehouseConfig) -> Result<Self, BusinessError> {
        let verifier = config
            .webhook_secret
            .as_deref()
            .map(|secret| WebhookVerifier::new(secret, config.webhook_tolerance_secs))
            .transpose()?
            .map(Arc::new);

        let identity_header = HeaderName::from_bytes(config.identity_header.as_bytes())
            .map_err(|e| BusinessError::Validation(format!("invalid identity header: {}", e)))?;

        Ok(Self {
            ctx,
            verifier,
            identity_header,
        })
    }
}
