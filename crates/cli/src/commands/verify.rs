//! Signature verification command.
//!
//! Checks a captured request the way the store does: same message, same
//! secret, and a timestamp no further than `--max-skew` seconds from now.
//!
//! # Usage
//!
//! ```bash
//! grifon-sync verify --secret-env GRIFON_SECRET_SHOPA \
//!     --timestamp 1767225600 --signature 'abc...=' --body payload.json
//! ```

use std::path::Path;

use grifon_sync::{SigningError, verify_signature};
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

/// Errors from the verify command.
#[derive(Debug, Error)]
pub enum VerifyError {
    /// Secret variable unset.
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),

    /// Body file unreadable.
    #[error("Failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Signature or timestamp rejected.
    #[error("Signature rejected: {0}")]
    Rejected(#[from] SigningError),
}

/// Verify `signature` over the body file.
///
/// `max_skew` of `None` skips the timestamp window check.
///
/// # Errors
///
/// Returns an error if the secret or body is unavailable, or the signature
/// does not verify.
pub async fn run(
    secret_env: &str,
    timestamp: i64,
    signature: &str,
    body: &Path,
    max_skew: Option<i64>,
) -> Result<(), VerifyError> {
    let secret = std::env::var(secret_env)
        .map(SecretString::from)
        .map_err(|_| VerifyError::MissingEnvVar(secret_env.to_string()))?;

    let bytes = tokio::fs::read(body).await.map_err(|source| VerifyError::Read {
        path: body.display().to_string(),
        source,
    })?;

    let now = chrono::Utc::now().timestamp();
    check(&secret, timestamp, &bytes, signature, now, max_skew)?;

    tracing::debug!(timestamp, now, "Signature verified");
    super::emit_line("signature ok");
    Ok(())
}

fn check(
    secret: &SecretString,
    timestamp: i64,
    body: &[u8],
    signature: &str,
    now: i64,
    max_skew: Option<i64>,
) -> Result<(), SigningError> {
    verify_signature(
        secret.expose_secret().as_bytes(),
        timestamp,
        body,
        signature,
        now,
        max_skew,
    )
}
