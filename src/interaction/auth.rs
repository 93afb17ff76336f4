//! Verification of Slack request signatures.
//!
//! See <https://api.slack.com/authentication/verifying-requests-from-slack>.

use axum::http::HeaderMap;
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

/// Signature scheme version; Slack only defines `v0`.
pub const AUTH_VERSION: &str = "v0";

pub const TIMESTAMP_HEADER: &str = "x-slack-request-timestamp";
pub const SIGNATURE_HEADER: &str = "x-slack-signature";

/// Why a request failed authentication.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("missing `{0}` header")]
    MissingHeader(&'static str),
    #[error("malformed request timestamp `{0}`")]
    MalformedTimestamp(String),
    #[error("request timestamp is {age_secs}s away from receipt")]
    StaleTimestamp { age_secs: u64 },
    #[error("request signature does not match")]
    InvalidSignature,
}

/// Computes the `v0=<hex>` signature Slack sends for `body` at `timestamp`.
pub fn produce_signature(secret: &str, timestamp: i64, body: &[u8]) -> Option<String> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).ok()?;
    mac.update(format!("{AUTH_VERSION}:{timestamp}:").as_bytes());
    mac.update(body);

    Some(format!("{AUTH_VERSION}={}", hex::encode(mac.finalize().into_bytes())))
}

/// Checks `signature` against the one computed for `body` at `timestamp`.
///
/// The comparison ignores ASCII case and runs in constant time.
pub fn verify(secret: &str, body: &[u8], timestamp: i64, signature: &str) -> bool {
    let Some(expected) = produce_signature(secret, timestamp, body) else {
        return false;
    };
    let supplied = signature.to_ascii_lowercase();

    expected.as_bytes().ct_eq(supplied.as_bytes()).into()
}

/// Authenticates a request from its headers and raw body.
///
/// When `max_age_secs` is set, timestamps further than that from `received_at`
/// are rejected.
pub fn authenticate(secret: &str, headers: &HeaderMap, body: &[u8], received_at: DateTime<Utc>, max_age_secs: Option<u64>) -> Result<(), AuthError> {
    let timestamp = header(headers, TIMESTAMP_HEADER)?;
    let signature = header(headers, SIGNATURE_HEADER)?;

    let timestamp: i64 = timestamp.trim().parse().map_err(|_| AuthError::MalformedTimestamp(timestamp.to_string()))?;

    if let Some(max_age) = max_age_secs {
        let age_secs = received_at.timestamp().abs_diff(timestamp);
        if age_secs > max_age {
            return Err(AuthError::StaleTimestamp { age_secs });
        }
    }

    if verify(secret, body, timestamp, signature) {
        Ok(())
    } else {
        Err(AuthError::InvalidSignature)
    }
}

fn header<'a>(headers: &'a HeaderMap, name: &'static str) -> Result<&'a str, AuthError> {
    headers.get(name).and_then(|v| v.to_str().ok()).ok_or(AuthError::MissingHeader(name))
}
