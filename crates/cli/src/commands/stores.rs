//! Store listing command.

use std::path::Path;

use grifon_sync::ShopDirectory;
use serde_json::json;

/// Print one JSON line per configured store. Secrets are never printed.
///
/// # Errors
///
/// Returns an error if the shops file cannot be loaded.
pub fn run(shops_path: &Path) -> Result<(), grifon_sync::ConfigError> {
    let directory = ShopDirectory::from_yaml_file(shops_path)?;
    tracing::debug!(stores = directory.len(), path = %shops_path.display(), "Loaded shops");

    for shop in directory.iter() {
        super::emit(&json!({
            "store": shop.id,
            "endpoint": shop.endpoint_url(),
            "https": shop.trimmed_base_url().starts_with("https://"),
            "has_secret": shop.has_secret(),
            "allowed_ip": shop.allowed_ip,
        }));
    }
    Ok(())
}
