//! Shop credential directory.
//!
//! Each store that runs the `grifoncustomersync` module has its own base URL
//! and shared secret. The directory is built once and handed to
//! [`SyncClient`](crate::SyncClient); it is never mutated afterwards.
//!
//! # File format
//!
//! ```yaml
//! shops:
//!   shopA:
//!     base_url: https://shopA.gr
//!     secret: SECRET_A
//!     allowed_ip: 203.0.113.10
//!   shopB:
//!     base_url: https://shopB.gr
//! ```
//!
//! # Environment Variables
//!
//! - `GRIFON_SECRET_<STORE>` - Overrides the file secret for a store. The
//!   store id is upper-cased and every non-alphanumeric character becomes
//!   `_` (`shopA` → `GRIFON_SECRET_SHOPA`).

use std::collections::BTreeMap;
use std::net::IpAddr;
use std::path::Path;

use grifon_sync_core::StoreId;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, warn};

/// Prefix of the per-store secret override variables.
pub const SECRET_ENV_PREFIX: &str = "GRIFON_SECRET_";

/// Path of the sync endpoint relative to a store's base URL.
pub const SYNC_ENDPOINT_PATH: &str = "/module/grifoncustomersync/sync";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read shops file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid shops file: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("Invalid base_url for store {store}: {reason}")]
    InvalidUrl { store: String, reason: String },
    #[error("No shops configured")]
    Empty,
}

/// Credentials and endpoint of a single store.
///
/// Implements `Debug` manually to redact the shared secret.
#[derive(Clone)]
pub struct ShopConfig {
    /// Store identifier used by callers.
    pub id: StoreId,
    /// Store base URL (e.g. `https://shopA.gr`). Must be HTTPS to sync.
    pub base_url: String,
    /// HMAC signing secret shared with the store's module.
    pub secret: SecretString,
    /// Caller IP allow-listed in the store's module configuration.
    ///
    /// Informational only: the store enforces its allow-list, nothing in
    /// this crate checks it.
    pub allowed_ip: Option<IpAddr>,
}

impl std::fmt::Debug for ShopConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShopConfig")
            .field("id", &self.id)
            .field("base_url", &self.base_url)
            .field("secret", &"[REDACTED]")
            .field("allowed_ip", &self.allowed_ip)
            .finish()
    }
}

impl ShopConfig {
    /// Create a shop entry.
    #[must_use]
    pub fn new(
        id: impl Into<StoreId>,
        base_url: impl Into<String>,
        secret: SecretString,
    ) -> Self {
        Self {
            id: id.into(),
            base_url: base_url.into(),
            secret,
            allowed_ip: None,
        }
    }

    /// Base URL without trailing slashes.
    #[must_use]
    pub fn trimmed_base_url(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }

    /// Full URL of the store's sync endpoint.
    #[must_use]
    pub fn endpoint_url(&self) -> String {
        format!("{}{SYNC_ENDPOINT_PATH}", self.trimmed_base_url())
    }

    /// Whether a non-empty shared secret is configured.
    #[must_use]
    pub fn has_secret(&self) -> bool {
        !self.secret.expose_secret().is_empty()
    }
}

/// Immutable map of store id to shop credentials.
#[derive(Debug, Clone, Default)]
pub struct ShopDirectory {
    shops: BTreeMap<StoreId, ShopConfig>,
}

#[derive(Deserialize)]
struct ShopsFile {
    shops: BTreeMap<String, ShopEntry>,
}

#[derive(Deserialize)]
struct ShopEntry {
    base_url: String,
    #[serde(default)]
    secret: Option<String>,
    #[serde(default)]
    allowed_ip: Option<IpAddr>,
}

impl ShopDirectory {
    /// Build a directory from shop entries. Later entries replace earlier
    /// ones with the same id.
    #[must_use]
    pub fn new(shops: impl IntoIterator<Item = ShopConfig>) -> Self {
        Self {
            shops: shops
                .into_iter()
                .map(|shop| (shop.id.clone(), shop))
                .collect(),
        }
    }

    /// Look up a store.
    #[must_use]
    pub fn get(&self, store_id: &str) -> Option<&ShopConfig> {
        self.shops.get(store_id)
    }

    /// Iterate over all stores in id order.
    pub fn iter(&self) -> impl Iterator<Item = &ShopConfig> {
        self.shops.values()
    }

    /// Store ids in id order.
    pub fn store_ids(&self) -> impl Iterator<Item = &StoreId> {
        self.shops.keys()
    }

    /// Number of configured stores.
    #[must_use]
    pub fn len(&self) -> usize {
        self.shops.len()
    }

    /// Whether no stores are configured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.shops.is_empty()
    }

    /// Load the directory from a YAML file, applying secret overrides from
    /// the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file cannot be read or parsed, a base
    /// URL is not a valid URL, or no shops are defined.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;

        Self::from_yaml_str(&content, |key| std::env::var(key).ok())
    }

    /// Parse the directory from YAML, resolving secret overrides with `env`.
    ///
    /// A store left without any secret is still loaded (and logged); syncs
    /// to it fail with a missing-secret error.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the YAML is invalid, a base URL does not
    /// parse, or no shops are defined.
    pub fn from_yaml_str(
        yaml: &str,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let file: ShopsFile = serde_yaml::from_str(yaml)?;
        if file.shops.is_empty() {
            return Err(ConfigError::Empty);
        }

        let mut shops = Vec::with_capacity(file.shops.len());
        for (id, entry) in file.shops {
            url::Url::parse(&entry.base_url).map_err(|e| ConfigError::InvalidUrl {
                store: id.clone(),
                reason: e.to_string(),
            })?;

            let secret = match env(&secret_env_var(&id)) {
                Some(value) => {
                    debug!(store = %id, "Using shared secret from environment");
                    value
                }
                None => entry.secret.unwrap_or_default(),
            };

            if secret.is_empty() {
                warn!(store = %id, "No shared secret configured for store");
            }

            shops.push(ShopConfig {
                id: StoreId::new(id),
                base_url: entry.base_url,
                secret: SecretString::from(secret),
                allowed_ip: entry.allowed_ip,
            });
        }

        Ok(Self::new(shops))
    }
}

/// Name of the environment variable overriding a store's secret.
#[must_use]
pub fn secret_env_var(store_id: &str) -> String {
    let suffix: String = store_id
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_uppercase()
            } else {
                '_'
            }
        })
        .collect();
    format!("{SECRET_ENV_PREFIX}{suffix}")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::net::Ipv4Addr;

    use super::*;

    const YAML: &str = r"
shops:
  shopA:
    base_url: https://shopA.gr/
    secret: SECRET_A
    allowed_ip: 203.0.113.10
  shopB:
    base_url: https://shopB.gr
";

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn test_from_yaml_str() {
        let dir = ShopDirectory::from_yaml_str(YAML, no_env).unwrap();
        assert_eq!(dir.len(), 2);

        let a = dir.get("shopA").unwrap();
        assert_eq!(a.secret.expose_secret(), "SECRET_A");
        assert_eq!(
            a.allowed_ip,
            Some(IpAddr::V4(Ipv4Addr::new(203, 0, 113, 10)))
        );
        assert_eq!(
            a.endpoint_url(),
            "https://shopA.gr/module/grifoncustomersync/sync"
        );

        let b = dir.get("shopB").unwrap();
        assert!(!b.has_secret());
        assert_eq!(b.allowed_ip, None);
    }

    #[test]
    fn test_env_overrides_secret() {
        let dir = ShopDirectory::from_yaml_str(YAML, |key| {
            (key == "GRIFON_SECRET_SHOPB").then(|| "SECRET_B".to_string())
        })
        .unwrap();

        assert_eq!(dir.get("shopB").unwrap().secret.expose_secret(), "SECRET_B");
        assert_eq!(dir.get("shopA").unwrap().secret.expose_secret(), "SECRET_A");
    }

    #[test]
    fn test_invalid_url() {
        let yaml = "shops:\n  bad:\n    base_url: not a url\n";
        assert!(matches!(
            ShopDirectory::from_yaml_str(yaml, no_env),
            Err(ConfigError::InvalidUrl { store, .. }) if store == "bad"
        ));
    }

    #[test]
    fn test_empty_directory() {
        assert!(matches!(
            ShopDirectory::from_yaml_str("shops: {}\n", no_env),
            Err(ConfigError::Empty)
        ));
    }

    #[test]
    fn test_invalid_yaml() {
        assert!(matches!(
            ShopDirectory::from_yaml_str("shops: [", no_env),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_plain_http_still_loads() {
        let yaml = "shops:\n  insecure:\n    base_url: http://insecure.example\n    secret: s\n";
        let dir = ShopDirectory::from_yaml_str(yaml, no_env).unwrap();
        assert!(dir.get("insecure").is_some());
    }

    #[test]
    fn test_secret_env_var() {
        assert_eq!(secret_env_var("shopA"), "GRIFON_SECRET_SHOPA");
        assert_eq!(secret_env_var("shop-b.gr"), "GRIFON_SECRET_SHOP_B_GR");
    }

    #[test]
    fn test_new_replaces_duplicates() {
        let dir = ShopDirectory::new([
            ShopConfig::new("s", "https://one", SecretString::from("1".to_string())),
            ShopConfig::new("s", "https://two", SecretString::from("2".to_string())),
        ]);
        assert_eq!(dir.len(), 1);
        assert_eq!(dir.get("s").unwrap().base_url, "https://two");
    }

    #[test]
    fn test_debug_redacts_secret() {
        let shop = ShopConfig::new(
            "shopA",
            "https://shopA.gr",
            SecretString::from("SECRET_A".to_string()),
        );
        let debug = format!("{shop:?}");
        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains("SECRET_A"));
    }
}
