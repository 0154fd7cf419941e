//! Request signing for the sync endpoint.
//!
//! The store authenticates each request by recomputing
//! `base64(HMAC-SHA256(secret, "<timestamp>\n<raw body>"))` over the exact
//! bytes it received and comparing against `X-Grifon-Signature`. The body
//! signed here must therefore be the very byte string that is transmitted.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use hmac::{Hmac, Mac};
use serde::Serialize;
use sha2::Sha256;
use thiserror::Error;

/// Header carrying the Unix timestamp (seconds) used in the signature.
pub const TIMESTAMP_HEADER: &str = "X-Grifon-Timestamp";

/// Header carrying the base64 signature.
pub const SIGNATURE_HEADER: &str = "X-Grifon-Signature";

/// Maximum clock skew the store accepts by default, in seconds.
pub const DEFAULT_MAX_SKEW_SECS: i64 = 300;

type HmacSha256 = Hmac<Sha256>;

/// Errors from signing or verifying a request.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SigningError {
    /// Signature does not match the body.
    #[error("signature mismatch")]
    Mismatch,

    /// Timestamp outside the accepted window.
    #[error("stale timestamp: {skew}s from now exceeds {max_skew}s")]
    StaleTimestamp {
        /// Absolute difference from the reference time.
        skew: i64,
        /// Maximum accepted difference.
        max_skew: i64,
    },

    /// Timestamp is zero or negative.
    #[error("invalid timestamp: {0}")]
    InvalidTimestamp(i64),

    /// The secret was rejected as an HMAC key.
    #[error("invalid signing key: {0}")]
    InvalidKey(String),
}

/// Serialize a value into the canonical request body.
///
/// Output is compact (no whitespace between tokens), keeps struct field
/// order, and writes non-ASCII characters as raw UTF-8 rather than `\u`
/// escapes.
///
/// # Errors
///
/// Returns an error if the value cannot be represented as JSON.
pub fn canonical_json<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>, serde_json::Error> {
    serde_json::to_vec(value)
}

/// Sign a raw request body.
///
/// Returns the base64-encoded HMAC-SHA256 of `"{timestamp}\n"` followed by
/// `body`.
///
/// # Errors
///
/// Returns [`SigningError::InvalidKey`] if the HMAC cannot be keyed with
/// `secret`.
pub fn sign_body(secret: &[u8], timestamp: i64, body: &[u8]) -> Result<String, SigningError> {
    let mac = mac_for(secret, timestamp, body)?;
    Ok(STANDARD.encode(mac.finalize().into_bytes()))
}

/// Verify a signature the way the receiving store does.
///
/// When `max_skew` is set, `timestamp` must be within that many seconds of
/// `now`.
///
/// # Errors
///
/// Returns [`SigningError`] if the timestamp is invalid or stale, or if the
/// signature does not match.
pub fn verify_signature(
    secret: &[u8],
    timestamp: i64,
    body: &[u8],
    signature: &str,
    now: i64,
    max_skew: Option<i64>,
) -> Result<(), SigningError> {
    if timestamp <= 0 {
        return Err(SigningError::InvalidTimestamp(timestamp));
    }

    if let Some(max_skew) = max_skew {
        let skew = (now - timestamp).abs();
        if skew > max_skew {
            return Err(SigningError::StaleTimestamp { skew, max_skew });
        }
    }

    let Ok(expected) = STANDARD.decode(signature.trim()) else {
        return Err(SigningError::Mismatch);
    };

    // verify_slice compares in constant time
    mac_for(secret, timestamp, body)?
        .verify_slice(&expected)
        .map_err(|_| SigningError::Mismatch)
}

fn mac_for(secret: &[u8], timestamp: i64, body: &[u8]) -> Result<HmacSha256, SigningError> {
    let mut mac =
        HmacSha256::new_from_slice(secret).map_err(|e| SigningError::InvalidKey(e.to_string()))?;
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b"\n");
    mac.update(body);
    Ok(mac)
}
