//! Grifon Sync - signed customer sync to PrestaShop stores.
//!
//! This crate provides:
//! - [`ShopDirectory`] of store credentials, loaded from YAML or built in code
//! - [`hash_password_2y`] for PHP-compatible `$2y$` bcrypt hashes
//! - [`sign_body`] for the `X-Grifon-Signature` HMAC
//! - [`SyncClient`] for pushing payloads to the `grifoncustomersync` module
//!
//! # Flow
//!
//! 1. Backend hashes the customer's password with [`hash_password_2y`]
//! 2. Payload is assembled with [`build_payload`](grifon_sync_core::build_payload)
//! 3. [`SyncClient::sync_customer`] serializes it, signs timestamp and body,
//!    and POSTs it to the store
//! 4. The store verifies the signature, upserts the customer and answers
//!    with a JSON report

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod client;
pub mod config;
pub mod error;
pub mod password;
pub mod response;
pub mod signing;

pub use client::{DEFAULT_TIMEOUT, SignedRequest, SyncClient, SyncSettings, status_and_body};
pub use config::{ConfigError, ShopConfig, ShopDirectory};
pub use error::{ErrorDetails, SyncError};
pub use password::{PasswordError, hash_password_2y, is_bcrypt_hash, verify_password};
pub use response::{SyncReport, SyncResponse};
pub use signing::{SigningError, canonical_json, sign_body, verify_signature};
