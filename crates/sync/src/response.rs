//! Successful sync responses.

use std::collections::BTreeMap;

use grifon_sync_core::ExternalAddressId;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// A store's answer to a successful (HTTP 200) sync.
///
/// The body is passed through exactly as the store sent it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncResponse {
    /// HTTP status code (always 200).
    pub status: u16,
    /// Parsed JSON body.
    pub body: Value,
}

impl SyncResponse {
    /// Read the body as the module's standard report.
    ///
    /// # Errors
    ///
    /// Returns an error if the body does not have the report shape.
    pub fn report(&self) -> Result<SyncReport, serde_json::Error> {
        SyncReport::deserialize(&self.body)
    }
}

/// Report returned by the `grifoncustomersync` module.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncReport {
    pub ok: bool,
    /// A new customer was created.
    #[serde(default)]
    pub created: bool,
    /// An existing customer was updated.
    #[serde(default)]
    pub updated: bool,
    /// Non-fatal problems, e.g. `ADDRESS_SKIPPED_unknown_countryIso:XX`.
    #[serde(default)]
    pub warnings: Vec<String>,
    /// PrestaShop customer id.
    #[serde(default)]
    pub ps_customer_id: Option<i64>,
    /// PrestaShop address id per external address id.
    #[serde(default, deserialize_with = "map_or_list")]
    pub ps_address_ids: BTreeMap<ExternalAddressId, i64>,
}

impl SyncReport {
    /// Warnings about skipped or failed addresses.
    pub fn address_warnings(&self) -> impl Iterator<Item = &str> {
        self.warnings
            .iter()
            .map(String::as_str)
            .filter(|w| w.starts_with("ADDRESS_"))
    }
}

/// PHP encodes an empty (or integer-keyed) associative array as a JSON list.
fn map_or_list<'de, D>(deserializer: D) -> Result<BTreeMap<ExternalAddressId, i64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum MapOrList {
        Map(BTreeMap<ExternalAddressId, i64>),
        List(Vec<i64>),
    }

    Ok(match MapOrList::deserialize(deserializer)? {
        MapOrList::Map(map) => map,
        MapOrList::List(list) => list
            .into_iter()
            .enumerate()
            .map(|(index, id)| (ExternalAddressId::new(index.to_string()), id))
            .collect(),
    })
}
