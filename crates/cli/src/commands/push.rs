//! Customer push command.
//!
//! # Input file
//!
//! JSON or YAML with the fields of
//! [`CustomerSyncRequest`](grifon_sync_core::CustomerSyncRequest):
//!
//! ```yaml
//! external_customer_id: cust_123
//! email: user@example.com
//! firstname: Name
//! lastname: Surname
//! password_hashed: $2y$12$...
//! company: ACME SA
//! groups_default: 4
//! groups_list: [4, 7]
//! addresses:
//!   - externalAddressId: addr_1
//!     alias: Billing
//!     address1: Ermou 1
//!     postcode: "10563"
//!     city: Athens
//!     countryIso: GR
//! ```
//!
//! `password_hashed` may be left out when `--password-env` names a variable
//! holding the plaintext password; it is then hashed locally.
//!
//! # Output
//!
//! One JSON line per store: `{"store": ..., "status": ..., "result": ...}`.

use std::path::Path;

use grifon_sync::{
    ShopDirectory, SyncClient, SyncError, SyncResponse, SyncSettings, hash_password_2y,
    is_bcrypt_hash, password::DEFAULT_COST, status_and_body,
};
use grifon_sync_core::{CustomerPayload, CustomerSyncRequest, StoreId, build_payload};
use secrecy::SecretString;
use serde_json::{Value, json};
use thiserror::Error;
use tracing::{debug, info, warn};

const PASSWORD_HASHED_KEY: &str = "password_hashed";

/// Errors from the push command.
#[derive(Debug, Error)]
pub enum PushError {
    /// Customer file unreadable.
    #[error("Failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Customer file is not valid JSON/YAML or lacks required fields.
    #[error("Invalid customer file: {0}")]
    Parse(String),

    /// Neither `password_hashed` nor `--password-env` given.
    #[error("Customer file has no password_hashed and no --password-env was given")]
    MissingPassword,

    /// `--password-env` variable unset.
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),

    /// `password_hashed` is not a bcrypt hash the store accepts.
    #[error("password_hashed is not a bcrypt $2y$ hash")]
    InvalidPasswordHash,

    /// Hashing failed.
    #[error(transparent)]
    Password(#[from] grifon_sync::PasswordError),

    /// Shops directory could not be loaded.
    #[error(transparent)]
    Config(#[from] grifon_sync::ConfigError),

    /// Client construction failed.
    #[error(transparent)]
    Client(#[from] SyncError),

    /// At least one store rejected the sync.
    #[error("{failed} of {total} store(s) failed")]
    Failed { failed: usize, total: usize },
}

/// Sync the customer in `payload_path` to the selected stores.
///
/// # Errors
///
/// Returns an error if the input or shops file is invalid, or if any store
/// sync fails (after all stores have been attempted).
pub async fn run(
    payload_path: &Path,
    stores: &[String],
    shops_path: &Path,
    password_env: Option<&str>,
) -> Result<(), PushError> {
    let content =
        tokio::fs::read_to_string(payload_path)
            .await
            .map_err(|source| PushError::Read {
                path: payload_path.display().to_string(),
                source,
            })?;

    let password = password_env
        .map(|var| {
            std::env::var(var)
                .map(SecretString::from)
                .map_err(|_| PushError::MissingEnvVar(var.to_string()))
        })
        .transpose()?;

    let payload = load_payload(&content, password.as_ref())?;
    info!(
        customer = %payload.external_customer_id,
        addresses = payload.addresses.len(),
        "Loaded customer"
    );

    let directory = ShopDirectory::from_yaml_file(shops_path)?;
    let client = SyncClient::new(directory, SyncSettings::default())?;

    let results: Vec<(StoreId, Result<SyncResponse, SyncError>)> = if stores.is_empty() {
        client.sync_all(&payload).await
    } else {
        let mut results = Vec::with_capacity(stores.len());
        for store in stores {
            let result = client.sync_customer(store, &payload).await;
            results.push((StoreId::new(store.as_str()), result));
        }
        results
    };

    let total = results.len();
    let mut failed = 0;
    for (store, result) in &results {
        match result {
            Ok(response) => log_report(store, response),
            Err(e) => {
                warn!(
                    store = %store,
                    status = e.status(),
                    reached_store = e.reached_store(),
                    error = %e,
                    "Sync failed"
                );
                failed += 1;
            }
        }
        super::emit(&report_line(store, result));
    }

    if failed > 0 {
        return Err(PushError::Failed { failed, total });
    }
    Ok(())
}

/// Parse the customer file and build the payload.
fn load_payload(
    content: &str,
    password: Option<&SecretString>,
) -> Result<CustomerPayload, PushError> {
    // YAML is a superset of JSON, so one parser covers both formats
    let mut value: Value =
        serde_yaml::from_str(content).map_err(|e| PushError::Parse(e.to_string()))?;

    let object = value
        .as_object_mut()
        .ok_or_else(|| PushError::Parse("expected a mapping at the top level".to_string()))?;

    let has_hash = object
        .get(PASSWORD_HASHED_KEY)
        .and_then(Value::as_str)
        .is_some_and(|s| !s.is_empty());

    if !has_hash {
        let password = password.ok_or(PushError::MissingPassword)?;
        let hash = hash_password_2y(password, DEFAULT_COST)?;
        object.insert(PASSWORD_HASHED_KEY.to_string(), Value::String(hash));
    }

    let request: CustomerSyncRequest =
        serde_json::from_value(value).map_err(|e| PushError::Parse(e.to_string()))?;

    if !is_bcrypt_hash(&request.password_hashed) {
        return Err(PushError::InvalidPasswordHash);
    }

    Ok(build_payload(request))
}

/// Log the store's report; skipped addresses do not fail the sync.
fn log_report(store: &StoreId, response: &SyncResponse) {
    match response.report() {
        Ok(report) => {
            info!(
                store = %store,
                created = report.created,
                updated = report.updated,
                ps_customer_id = ?report.ps_customer_id,
                "Store accepted customer"
            );
            for warning in report.address_warnings() {
                warn!(store = %store, warning, "Address not saved");
            }
        }
        Err(e) => debug!(store = %store, error = %e, "Response is not a sync report"),
    }
}

fn report_line(store: &StoreId, result: &Result<SyncResponse, SyncError>) -> Value {
    let (status, body) = status_and_body(result);
    json!({
        "store": store,
        "status": status,
        "result": body,
    })
}
