//! GitHub webhook signature verification.
//!
//! GitHub signs each delivery with HMAC-SHA256 over the raw request body and
//! sends the hex digest in `X-Hub-Signature-256` as `sha256=<hex>`.
//! Reference: https://docs.github.com/en/webhooks/using-webhooks/validating-webhook-deliveries

use hmac::{Hmac, Mac};
use sha2::Sha256;
use thiserror::Error;
use tracing::warn;

type HmacSha256 = Hmac<Sha256>;

/// Header carrying the body signature.
pub const SIGNATURE_HEADER: &str = "X-Hub-Signature-256";

const SIGNATURE_PREFIX: &str = "sha256=";

/// Reasons a delivery fails verification.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignatureError {
    #[error("signature header missing")]
    Missing,
    #[error("signature header is not of the form sha256=<hex>")]
    Format,
    #[error("signature mismatch")]
    Mismatch,
}

/// Verify a GitHub webhook signature.
///
/// # Arguments
///
/// * `secret` - The configured webhook secret; `None` or blank skips verification
/// * `body` - The raw request body, exactly as received
/// * `signature_header` - The `X-Hub-Signature-256` header value, if present
///
/// Skipping verification when no secret is configured is meant for local
/// testing only.
pub fn verify_github_signature(
    secret: Option<&str>,
    body: &[u8],
    signature_header: Option<&str>,
) -> Result<(), SignatureError> {
    let secret = match secret {
        Some(s) if !s.trim().is_empty() => s,
        _ => return Ok(()),
    };

    let header = match signature_header {
        Some(h) if !h.is_empty() => h,
        _ => {
            warn!("github_signature_missing");
            return Err(SignatureError::Missing);
        }
    };

    let provided = match header.strip_prefix(SIGNATURE_PREFIX) {
        Some(hex) => hex,
        None => {
            warn!(header_length = header.len(), "github_signature_bad_format");
            return Err(SignatureError::Format);
        }
    };

    let provided = match hex::decode(provided) {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!(error = %e, "github_signature_bad_hex");
            return Err(SignatureError::Format);
        }
    };

    let mut mac = match HmacSha256::new_from_slice(secret.as_bytes()) {
        Ok(mac) => mac,
        Err(_) => {
            warn!("github_signature_invalid_key");
            return Err(SignatureError::Mismatch);
        }
    };
    mac.update(body);

    // verify_slice compares in constant time
    if mac.verify_slice(&provided).is_err() {
        warn!(actual_length = provided.len(), "github_signature_mismatch");
        return Err(SignatureError::Mismatch);
    }

    Ok(())
}

/// Hex-encoded HMAC-SHA256 of `body` under `secret`.
pub fn compute_signature(secret: &str, body: &[u8]) -> Option<String> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).ok()?;
    mac.update(body);
    Some(hex::encode(mac.finalize().into_bytes()))
}

/// Check if signature verification is enabled.
pub fn is_signature_verification_enabled(secret: &Option<String>) -> bool {
    secret
        .as_ref()
        .map(|k| !k.trim().is_empty())
        .unwrap_or(false)
}
