//! Body signing command.
//!
//! Prints the timestamp and signature headers for a body file, for checking
//! a store's module configuration with `curl`.

use std::path::Path;

use grifon_sync::sign_body;
use grifon_sync::signing::{SIGNATURE_HEADER, TIMESTAMP_HEADER};
use secrecy::{ExposeSecret, SecretString};

/// Sign a body file with the secret from `secret_env`.
///
/// # Errors
///
/// Returns an error if the variable is unset, the file cannot be read, or
/// the secret cannot key the HMAC.
pub async fn run(
    secret_env: &str,
    timestamp: Option<i64>,
    body: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    let secret = std::env::var(secret_env)
        .map(SecretString::from)
        .map_err(|_| format!("{secret_env} not set"))?;

    let bytes = tokio::fs::read(body).await?;
    let timestamp = timestamp.unwrap_or_else(|| chrono::Utc::now().timestamp());
    let signature = sign_body(secret.expose_secret().as_bytes(), timestamp, &bytes)?;

    tracing::debug!(path = %body.display(), bytes = bytes.len(), "Body signed");
    super::emit_line(&format!("{TIMESTAMP_HEADER}: {timestamp}"));
    super::emit_line(&format!("{SIGNATURE_HEADER}: {signature}"));
    Ok(())
}
