//! Webhook signature verification
//!
//! The identity provider signs each delivery with the Svix scheme:
//!
//! ```text
//! signed_content = "{svix-id}.{svix-timestamp}.{raw body}"
//! signature      = base64(HMAC-SHA256(secret_key, signed_content))
//! svix-signature = "v1,<sig> v1,<sig2> ..."
//! ```
//!
//! The secret looks like `whsec_<base64 key>`. Verification runs on the raw
//! body, before any JSON parsing.

use crate::error::BusinessError;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use chrono::Utc;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::fmt;
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

const SECRET_PREFIX: &str = "whsec_";
const SIGNATURE_VERSION: &str = "v1";

/// Default replay window in seconds
pub const DEFAULT_TOLERANCE_SECS: u64 = 300;

/// The three signing headers of a delivery, as received
#[derive(Debug, Clone, Default)]
pub struct WebhookHeaders {
    pub id: Option<String>,
    pub timestamp: Option<String>,
    pub signature: Option<String>,
}

impl WebhookHeaders {
    pub fn new(id: Option<&str>, timestamp: Option<&str>, signature: Option<&str>) -> Self {
        Self {
            id: id.map(str::to_string),
            timestamp: timestamp.map(str::to_string),
            signature: signature.map(str::to_string),
        }
    }

    /// All three headers must be present and non-blank
    fn require(&self) -> Result<(&str, &str, &str), BusinessError> {
        fn present(v: &Option<String>) -> Option<&str> {
            v.as_deref().filter(|s| !s.trim().is_empty())
        }

        match (
            present(&self.id),
            present(&self.timestamp),
            present(&self.signature),
        ) {
            (Some(id), Some(ts), Some(sig)) => Ok((id, ts, sig)),
            _ => Err(BusinessError::MissingSignatureHeaders),
        }
    }
}

/// Verifier for identity provider webhooks
#[derive(Clone)]
pub struct WebhookVerifier {
    key: Vec<u8>,
    tolerance_secs: u64,
}

impl fmt::Debug for WebhookVerifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WebhookVerifier")
            .field("key", &"<redacted>")
            .field("tolerance_secs", &self.tolerance_secs)
            .finish()
    }
}

impl WebhookVerifier {
    /// Build a verifier from a `whsec_<base64>` secret (prefix optional)
    pub fn new(secret: &str, tolerance_secs: u64) -> Result<Self, BusinessError> {
        let encoded = secret.trim();
        let encoded = encoded.strip_prefix(SECRET_PREFIX).unwrap_or(encoded);
        if encoded.is_empty() {
            return Err(BusinessError::WebhookMisconfigured(
                "secret is empty".to_string(),
            ));
        }

        let key = STANDARD
            .decode(encoded)
            .map_err(|e| BusinessError::WebhookMisconfigured(format!("secret is not base64: {}", e)))?;

        Ok(Self {
            key,
            tolerance_secs,
        })
    }

    /// `v1,<base64>` header value for the given delivery
    pub fn sign(&self, id: &str, timestamp: i64, payload: &[u8]) -> Result<String, BusinessError> {
        let raw = self.compute(id, &timestamp.to_string(), payload)?;
        Ok(format!("{},{}", SIGNATURE_VERSION, STANDARD.encode(raw)))
    }

    /// Verify against the system clock
    pub fn verify(&self, headers: &WebhookHeaders, payload: &[u8]) -> Result<(), BusinessError> {
        self.verify_at(headers, payload, Utc::now().timestamp())
    }

    /// Verify against a given `now` (unix seconds)
    pub fn verify_at(
        &self,
        headers: &WebhookHeaders,
        payload: &[u8],
        now: i64,
    ) -> Result<(), BusinessError> {
        let (id, timestamp, signatures) = headers.require()?;

        let sent_at: i64 = timestamp
            .trim()
            .parse()
            .map_err(|_| BusinessError::InvalidSignature("invalid timestamp".to_string()))?;
        if now.abs_diff(sent_at) > self.tolerance_secs {
            return Err(BusinessError::InvalidSignature(
                "timestamp outside tolerance".to_string(),
            ));
        }

        let expected = self.compute(id, timestamp.trim(), payload)?;

        let matched = signatures
            .split_whitespace()
            .filter_map(|entry| entry.split_once(','))
            .filter(|(version, _)| *version == SIGNATURE_VERSION)
            .filter_map(|(_, sig)| STANDARD.decode(sig).ok())
            .any(|candidate| bool::from(expected.ct_eq(candidate.as_slice())));

        if matched {
            Ok(())
        } else {
            Err(BusinessError::InvalidSignature(
                "no matching signature".to_string(),
            ))
        }
    }

    fn compute(&self, id: &str, timestamp: &str, payload: &[u8]) -> Result<Vec<u8>, BusinessError> {
        let mut mac = HmacSha256::new_from_slice(&self.key)
            .map_err(|e| BusinessError::WebhookMisconfigured(e.to_string()))?;
        mac.update(id.as_bytes());
        mac.update(b".");
        mac.update(timestamp.as_bytes());
        mac.update(b".");
        mac.update(payload);
        Ok(mac.finalize().into_bytes().to_vec())
    }
}
