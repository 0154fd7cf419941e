//! Integration tests for Grifon customer sync.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p grifon-sync-integration-tests
//! ```
//!
//! Tests run the real [`SyncClient`] against `wiremock` servers standing in
//! for a store's `grifoncustomersync` module. Mock servers listen on plain
//! HTTP, so the helpers here enable [`SyncSettings::allow_plain_http`].

use grifon_sync::{ShopConfig, ShopDirectory, SyncClient, SyncSettings};
use grifon_sync_core::{
    Address, CustomerPayload, CustomerSyncRequest, Email, ExternalCustomerId, GroupId,
    build_payload,
};
use secrecy::SecretString;

/// Endpoint path the client posts to.
pub const SYNC_PATH: &str = "/module/grifoncustomersync/sync";

/// A bcrypt-shaped hash; tests never verify it.
pub const PASSWORD_HASH: &str = "$2y$12$abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXY./";

/// Build a shop entry.
#[must_use]
pub fn shop(id: &str, base_url: &str, secret: &str) -> ShopConfig {
    ShopConfig::new(id, base_url, SecretString::from(secret.to_string()))
}

/// Client that accepts `http://` mock endpoints.
///
/// # Panics
///
/// Panics if the HTTP client cannot be built.
#[must_use]
pub fn mock_client(shops: impl IntoIterator<Item = ShopConfig>) -> SyncClient {
    let settings = SyncSettings {
        allow_plain_http: true,
        ..SyncSettings::default()
    };
    SyncClient::new(ShopDirectory::new(shops), settings).expect("build sync client")
}

/// Client with production settings (HTTPS only).
///
/// # Panics
///
/// Panics if the HTTP client cannot be built.
#[must_use]
pub fn strict_client(shops: impl IntoIterator<Item = ShopConfig>) -> SyncClient {
    SyncClient::new(ShopDirectory::new(shops), SyncSettings::default())
        .expect("build sync client")
}

/// The sample customer used across tests.
///
/// # Panics
///
/// Never in practice; the email literal is valid.
#[must_use]
pub fn sample_payload() -> CustomerPayload {
    build_payload(CustomerSyncRequest {
        external_customer_id: ExternalCustomerId::new("cust_123"),
        email: Email::parse("user@example.com").expect("valid email"),
        firstname: "Νίκος".to_string(),
        lastname: "Surname".to_string(),
        password_hashed: PASSWORD_HASH.to_string(),
        company: Some("ACME SA".to_string()),
        website: Some("https://example.com".to_string()),
        siret: None,
        ape: None,
        groups_default: GroupId::new(4),
        groups_list: vec![GroupId::new(4), GroupId::new(7)],
        addresses: vec![
            Address::new("addr_1", "Billing", "Ermou 1", "Athens", "GR")
                .with_postcode("10563")
                .with_vat_number("EL123456789")
                .with_company("ACME SA"),
        ],
    })
}
