//! Customer payload records.
//!
//! These types mirror the JSON document accepted by the store's
//! `/module/grifoncustomersync/sync` endpoint. Field declaration order is the
//! key order on the wire, which keeps serialization deterministic for
//! signing.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::types::{Email, ExternalAddressId, ExternalCustomerId, GroupId};

/// Complete sync document for one customer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerPayload {
    /// Backend identifier the store maps to its own customer id.
    #[serde(rename = "externalCustomerId")]
    pub external_customer_id: ExternalCustomerId,
    /// Profile fields.
    pub customer: CustomerProfile,
    /// Group membership.
    pub groups: Groups,
    /// Addresses, in the order they should be upserted.
    #[serde(default)]
    pub addresses: Vec<Address>,
}

/// Customer profile fields.
///
/// Optional B2B fields are omitted from the JSON entirely when absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerProfile {
    pub email: Email,
    pub firstname: String,
    pub lastname: String,
    /// bcrypt hash with a `$2y$` identifier.
    pub password_hashed: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub siret: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ape: Option<String>,
}

/// Customer group membership.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Groups {
    /// Default group, also set as the customer's `id_default_group`.
    pub default: GroupId,
    /// All groups the customer belongs to.
    pub list: Vec<GroupId>,
}

/// Customer address.
///
/// A free-form JSON object sent exactly as given. Only the structure is
/// checked here: recognized keys may hold any JSON value and may be missing,
/// because the store casts each one itself and skips (with an
/// `ADDRESS_SKIPPED_*` warning) an address it cannot save while still
/// syncing the customer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Address(Map<String, Value>);

/// Address keys the store recognizes.
pub mod address_keys {
    pub const EXTERNAL_ADDRESS_ID: &str = "externalAddressId";
    pub const ALIAS: &str = "alias";
    pub const FIRSTNAME: &str = "firstname";
    pub const LASTNAME: &str = "lastname";
    pub const ADDRESS1: &str = "address1";
    pub const ADDRESS2: &str = "address2";
    pub const POSTCODE: &str = "postcode";
    pub const CITY: &str = "city";
    pub const COUNTRY_ISO: &str = "countryIso";
    pub const STATE_ISO: &str = "stateIso";
    pub const COMPANY: &str = "company";
    pub const VAT_NUMBER: &str = "vat_number";
    pub const PHONE: &str = "phone";
    pub const PHONE_MOBILE: &str = "phone_mobile";
    pub const DNI: &str = "dni";
    pub const OTHER: &str = "other";
}

impl Address {
    /// Create an address with the fields the store needs to save it.
    #[must_use]
    pub fn new(
        external_address_id: impl Into<ExternalAddressId>,
        alias: impl Into<String>,
        address1: impl Into<String>,
        city: impl Into<String>,
        country_iso: impl Into<String>,
    ) -> Self {
        Self::default()
            .with(
                address_keys::EXTERNAL_ADDRESS_ID,
                external_address_id.into().into_inner(),
            )
            .with(address_keys::ALIAS, alias.into())
            .with(address_keys::ADDRESS1, address1.into())
            .with(address_keys::CITY, city.into())
            .with(address_keys::COUNTRY_ISO, country_iso.into())
    }

    /// Set any key, replacing a previous value.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    /// Set the postcode.
    #[must_use]
    pub fn with_postcode(self, postcode: impl Into<String>) -> Self {
        self.with(address_keys::POSTCODE, postcode.into())
    }

    /// Set the company name.
    #[must_use]
    pub fn with_company(self, company: impl Into<String>) -> Self {
        self.with(address_keys::COMPANY, company.into())
    }

    /// Set the VAT number (e.g. `EL123456789`).
    #[must_use]
    pub fn with_vat_number(self, vat_number: impl Into<String>) -> Self {
        self.with(address_keys::VAT_NUMBER, vat_number.into())
    }

    /// Value stored under `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// The external address id, when it is a string.
    #[must_use]
    pub fn external_address_id(&self) -> Option<&str> {
        self.get(address_keys::EXTERNAL_ADDRESS_ID)
            .and_then(Value::as_str)
    }

    /// The underlying JSON object.
    #[must_use]
    pub const fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Consume the address and return its JSON object.
    #[must_use]
    pub fn into_map(self) -> Map<String, Value> {
        self.0
    }
}

impl From<Map<String, Value>> for Address {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

/// Inputs for [`build_payload`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerSyncRequest {
    pub external_customer_id: ExternalCustomerId,
    pub email: Email,
    pub firstname: String,
    pub lastname: String,
    pub password_hashed: String,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    pub siret: Option<String>,
    #[serde(default)]
    pub ape: Option<String>,
    pub groups_default: GroupId,
    #[serde(default)]
    pub groups_list: Vec<GroupId>,
    #[serde(default)]
    pub addresses: Vec<Address>,
}

/// Build the sync document for one customer.
///
/// Empty optional fields are dropped so that absence on the wire always
/// means "not provided" rather than "clear this field".
///
/// The email is the already-normalized [`Email`]: surrounding whitespace was
/// trimmed when it was parsed, and letter case is kept. That trimmed form is
/// what gets serialized and signed.
#[must_use]
pub fn build_payload(request: CustomerSyncRequest) -> CustomerPayload {
    CustomerPayload {
        external_customer_id: request.external_customer_id,
        customer: CustomerProfile {
            email: request.email,
            firstname: request.firstname,
            lastname: request.lastname,
            password_hashed: request.password_hashed,
            company: non_empty(request.company),
            website: non_empty(request.website),
            siret: non_empty(request.siret),
            ape: non_empty(request.ape),
        },
        groups: Groups {
            default: request.groups_default,
            list: request.groups_list,
        },
        addresses: request.addresses,
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}
