//! PHP-compatible bcrypt password hashing.
//!
//! PrestaShop stores customer passwords as bcrypt hashes produced by PHP's
//! `password_hash()`, which writes the `$2y$` identifier. The store rejects
//! `password_hashed` values that do not look like bcrypt, and its verifier
//! expects the `2y` tag, so hashes sent in a sync must carry it.

use bcrypt::{BcryptError, Version};
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

/// Default bcrypt cost factor.
pub const DEFAULT_COST: u32 = 12;

const MIN_COST: u32 = 4;
const MAX_COST: u32 = 31;

/// Length of a formatted bcrypt hash string.
const BCRYPT_HASH_LEN: usize = 60;

/// Errors that can occur while hashing or verifying passwords.
#[derive(Debug, Error)]
pub enum PasswordError {
    /// Cost factor outside bcrypt's accepted range.
    #[error("bcrypt cost {0} is out of range (4..=31)")]
    InvalidCost(u32),

    /// Underlying bcrypt failure (malformed hash, etc.).
    #[error("bcrypt error: {0}")]
    Bcrypt(#[from] BcryptError),
}

/// Hash a plaintext password with bcrypt, tagged `$2y$`.
///
/// # Errors
///
/// Returns [`PasswordError::InvalidCost`] if `cost` is outside 4..=31, or
/// [`PasswordError::Bcrypt`] if hashing fails.
pub fn hash_password_2y(password: &SecretString, cost: u32) -> Result<String, PasswordError> {
    if !(MIN_COST..=MAX_COST).contains(&cost) {
        return Err(PasswordError::InvalidCost(cost));
    }

    let parts = bcrypt::hash_with_result(password.expose_secret(), cost)?;
    Ok(parts.format_for_version(Version::TwoY))
}

/// Check a plaintext password against a bcrypt hash.
///
/// Accepts `$2y$`, `$2b$` and `$2a$` hashes.
///
/// # Errors
///
/// Returns [`PasswordError::Bcrypt`] if `hash` is not a valid bcrypt hash.
pub fn verify_password(password: &SecretString, hash: &str) -> Result<bool, PasswordError> {
    Ok(bcrypt::verify(password.expose_secret(), hash)?)
}

/// Returns true if `value` has the shape of a bcrypt hash the store will
/// accept in `password_hashed`.
///
/// The shape is `$2a$`, `$2b$` or `$2y$`, a two-digit cost, `$`, then 53
/// characters from the bcrypt base64 alphabet.
#[must_use]
pub fn is_bcrypt_hash(value: &str) -> bool {
    if value.len() != BCRYPT_HASH_LEN {
        return false;
    }

    let bytes = value.as_bytes();
    let Some((prefix, rest)) = bytes.split_at_checked(7) else {
        return false;
    };

    let header_ok = matches!(
        prefix,
        [b'$', b'2', b'a' | b'b' | b'y', b'$', d1, d2, b'$'] if d1.is_ascii_digit() && d2.is_ascii_digit()
    );

    header_ok
        && rest
            .iter()
            .all(|b| b.is_ascii_alphanumeric() || *b == b'.' || *b == b'/')
}
