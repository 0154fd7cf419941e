//! Grifon Sync Core - Shared customer payload types.
//!
//! This crate provides the types exchanged with the `grifoncustomersync`
//! PrestaShop module. It is used by:
//! - `grifon-sync` - Signed sync client that pushes payloads to stores
//! - `grifon-sync-cli` - Command-line tools for hashing, signing and pushing
//!
//! # Architecture
//!
//! The core crate contains only types and pure builders - no I/O, no HTTP
//! clients, no cryptography. This keeps it lightweight and allows it to be
//! used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for identifiers and emails
//! - [`payload`] - Customer payload records and the payload builder

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod payload;
pub mod types;

pub use payload::{
    Address, CustomerPayload, CustomerProfile, CustomerSyncRequest, Groups, address_keys,
    build_payload,
};
pub use types::*;
