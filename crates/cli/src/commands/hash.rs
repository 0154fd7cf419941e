//! Password hashing command.
//!
//! # Usage
//!
//! ```bash
//! GRIFON_PASSWORD='PasswordFromRegisterFlow' grifon-sync hash-password
//! echo 'PasswordFromRegisterFlow' | grifon-sync hash-password --cost 10
//! ```

use std::io::BufRead;

use grifon_sync::hash_password_2y;
use secrecy::SecretString;
use thiserror::Error;

/// Variable checked before falling back to stdin.
const PASSWORD_ENV: &str = "GRIFON_PASSWORD";

/// Errors that can occur while hashing.
#[derive(Debug, Error)]
pub enum HashError {
    /// No password supplied.
    #[error("No password given: set {PASSWORD_ENV} or pipe it on stdin")]
    MissingPassword,

    /// Reading stdin failed.
    #[error("Failed to read password: {0}")]
    Io(#[from] std::io::Error),

    /// Hashing failed.
    #[error(transparent)]
    Password(#[from] grifon_sync::PasswordError),
}

/// Hash a password and print the `$2y$` string.
///
/// # Errors
///
/// Returns an error if no password is available or hashing fails.
pub fn run(cost: u32) -> Result<(), HashError> {
    let password = read_password(std::env::var(PASSWORD_ENV).ok(), std::io::stdin().lock())?;
    let hash = hash_password_2y(&password, cost)?;
    tracing::debug!(cost, "Password hashed");
    super::emit_line(&hash);
    Ok(())
}

fn read_password(
    from_env: Option<String>,
    mut input: impl BufRead,
) -> Result<SecretString, HashError> {
    if let Some(password) = from_env.filter(|p| !p.is_empty()) {
        return Ok(SecretString::from(password));
    }

    let mut line = String::new();
    input.read_line(&mut line)?;
    let password = line.trim_end_matches(['\r', '\n']);
    if password.is_empty() {
        return Err(HashError::MissingPassword);
    }
    Ok(SecretString::from(password.to_string()))
}
