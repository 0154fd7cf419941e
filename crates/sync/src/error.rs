//! Sync-related errors.

use grifon_sync_core::StoreId;
use serde::Serialize;
use serde_json::{Value, json};
use thiserror::Error;

use crate::signing::SigningError;

/// Body returned by the store alongside a failed sync.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ErrorDetails {
    /// Body parsed as JSON (the module answers `{"ok":false,"error":...}`).
    Json(Value),
    /// Body that was not JSON, kept verbatim.
    Text(String),
}

impl ErrorDetails {
    /// Parse a response body, falling back to raw text.
    #[must_use]
    pub fn from_body(body: &str) -> Self {
        serde_json::from_str(body).map_or_else(|_| Self::Text(body.to_string()), Self::Json)
    }

    /// Convert into a JSON value (text becomes a JSON string).
    #[must_use]
    pub fn into_value(self) -> Value {
        match self {
            Self::Json(value) => value,
            Self::Text(text) => Value::String(text),
        }
    }
}

/// Errors that can occur when syncing a customer to a store.
///
/// Variants before [`SyncError::Http`] are raised before any response is
/// received and report status `0`.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Store id not present in the directory.
    #[error("Unknown store_id '{0}'")]
    UnknownStore(String),

    /// Store base URL is not HTTPS.
    #[error("HTTPS is required for base_url")]
    InsecureBaseUrl {
        /// Offending store.
        store: StoreId,
    },

    /// Store has no shared secret configured.
    #[error("Missing shared secret for store")]
    MissingSecret {
        /// Offending store.
        store: StoreId,
    },

    /// Payload could not be serialized.
    #[error("Failed to serialize payload: {0}")]
    Serialize(#[from] serde_json::Error),

    /// Request body could not be signed.
    #[error("Failed to sign payload: {0}")]
    Signing(#[from] SigningError),

    /// HTTP client could not be constructed.
    #[error("Failed to build HTTP client: {0}")]
    ClientBuild(#[source] reqwest::Error),

    /// Connection, TLS, or timeout failure.
    #[error("Request failed: {0}")]
    Transport(#[source] reqwest::Error),

    /// Store answered with a non-200 status.
    #[error("Sync failed with HTTP {status}")]
    Http {
        /// HTTP status code.
        status: u16,
        /// Response body.
        details: ErrorDetails,
    },

    /// Store answered 200 but the body was not JSON.
    #[error("Invalid JSON response")]
    InvalidJson {
        /// HTTP status code.
        status: u16,
        /// Raw response body.
        raw: String,
    },
}

impl SyncError {
    /// HTTP status associated with the failure, or `0` when no response was
    /// received.
    #[must_use]
    pub const fn status(&self) -> u16 {
        match self {
            Self::Http { status, .. } | Self::InvalidJson { status, .. } => *status,
            Self::UnknownStore(_)
            | Self::InsecureBaseUrl { .. }
            | Self::MissingSecret { .. }
            | Self::Serialize(_)
            | Self::Signing(_)
            | Self::ClientBuild(_)
            | Self::Transport(_) => 0,
        }
    }

    /// Whether the request reached the store.
    #[must_use]
    pub const fn reached_store(&self) -> bool {
        self.status() != 0
    }

    /// Render the error as `{"error": ..., "details": ...}`.
    ///
    /// `details` is present only when the store sent a body.
    #[must_use]
    pub fn to_json(&self) -> Value {
        match self {
            Self::Http { details, .. } => json!({
                "error": self.to_string(),
                "details": details,
            }),
            Self::InvalidJson { raw, .. } => json!({
                "error": self.to_string(),
                "details": raw,
            }),
            _ => json!({ "error": self.to_string() }),
        }
    }
}
