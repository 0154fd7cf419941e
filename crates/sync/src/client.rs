//! Signed sync client.
//!
//! Pushes customer payloads to a store's `grifoncustomersync` module. Each
//! call makes exactly one HTTPS POST; failures are returned, never retried.

use std::sync::Arc;
use std::time::Duration;

use grifon_sync_core::StoreId;
use reqwest::header::CONTENT_TYPE;
use secrecy::ExposeSecret;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, error, info, instrument, warn};

use crate::config::{ShopConfig, ShopDirectory};
use crate::error::{ErrorDetails, SyncError};
use crate::response::SyncResponse;
use crate::signing::{SIGNATURE_HEADER, TIMESTAMP_HEADER, canonical_json, sign_body};

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

/// Client behaviour settings.
#[derive(Debug, Clone)]
pub struct SyncSettings {
    /// Per-request timeout covering connect, send and response.
    pub timeout: Duration,
    /// Accept `http://` base URLs. Only for local mock endpoints in tests.
    pub allow_plain_http: bool,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            allow_plain_http: false,
        }
    }
}

/// A fully prepared request: the exact body bytes and the headers that sign
/// them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedRequest {
    /// Endpoint URL.
    pub url: String,
    /// Unix timestamp in seconds.
    pub timestamp: i64,
    /// Base64 HMAC-SHA256 signature.
    pub signature: String,
    /// Compact JSON body, transmitted verbatim.
    pub body: Vec<u8>,
}

/// Client for the store sync endpoint.
///
/// Cheap to clone; clones share the HTTP client and the read-only shop
/// directory, so calls for different stores can run concurrently.
#[derive(Clone)]
pub struct SyncClient {
    inner: Arc<SyncClientInner>,
}

struct SyncClientInner {
    client: reqwest::Client,
    directory: ShopDirectory,
    settings: SyncSettings,
}

impl std::fmt::Debug for SyncClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncClient")
            .field("directory", &self.inner.directory)
            .field("settings", &self.inner.settings)
            .finish_non_exhaustive()
    }
}

impl SyncClient {
    /// Create a client for the given stores.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::ClientBuild`] if the HTTP client cannot be
    /// constructed (e.g. TLS backend initialization fails).
    pub fn new(directory: ShopDirectory, settings: SyncSettings) -> Result<Self, SyncError> {
        let client = reqwest::Client::builder()
            .timeout(settings.timeout)
            .build()
            .map_err(SyncError::ClientBuild)?;

        Ok(Self {
            inner: Arc::new(SyncClientInner {
                client,
                directory,
                settings,
            }),
        })
    }

    /// The stores this client can sync to.
    #[must_use]
    pub fn directory(&self) -> &ShopDirectory {
        &self.inner.directory
    }

    /// Validate the store and build the signed request for `payload`.
    ///
    /// No network I/O happens here.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::UnknownStore`], [`SyncError::InsecureBaseUrl`],
    /// [`SyncError::MissingSecret`], [`SyncError::Serialize`] or
    /// [`SyncError::Signing`].
    pub fn prepare<T: Serialize + ?Sized>(
        &self,
        store_id: &str,
        payload: &T,
        timestamp: i64,
    ) -> Result<SignedRequest, SyncError> {
        let shop = self.resolve(store_id)?;
        let body = canonical_json(payload)?;
        let signature = sign_body(shop.secret.expose_secret().as_bytes(), timestamp, &body)?;

        Ok(SignedRequest {
            url: shop.endpoint_url(),
            timestamp,
            signature,
            body,
        })
    }

    /// Sync one payload to one store.
    ///
    /// On success returns the store's JSON body unchanged.
    ///
    /// # Errors
    ///
    /// Returns a [`SyncError`] for an unknown store, non-HTTPS base URL,
    /// missing secret, transport failure, non-200 response, or a 200
    /// response whose body is not JSON.
    #[instrument(skip_all, fields(store = %store_id))]
    pub async fn sync_customer<T: Serialize + ?Sized>(
        &self,
        store_id: &str,
        payload: &T,
    ) -> Result<SyncResponse, SyncError> {
        let timestamp = chrono::Utc::now().timestamp();
        let request = self.prepare(store_id, payload, timestamp)?;
        self.send(request).await
    }

    /// Sync the same payload to every configured store, one after another.
    ///
    /// Results are returned in store id order; a failure for one store does
    /// not stop the others.
    pub async fn sync_all<T: Serialize + ?Sized>(
        &self,
        payload: &T,
    ) -> Vec<(StoreId, Result<SyncResponse, SyncError>)> {
        let mut results = Vec::with_capacity(self.inner.directory.len());
        for store_id in self.inner.directory.store_ids() {
            let result = self.sync_customer(store_id.as_str(), payload).await;
            results.push((store_id.clone(), result));
        }
        results
    }

    /// Send a prepared request and normalize the response.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Transport`], [`SyncError::Http`] or
    /// [`SyncError::InvalidJson`].
    pub async fn send(&self, request: SignedRequest) -> Result<SyncResponse, SyncError> {
        debug!(
            url = %request.url,
            timestamp = request.timestamp,
            body_len = request.body.len(),
            "Sending signed sync request"
        );

        let response = self
            .inner
            .client
            .post(&request.url)
            .header(CONTENT_TYPE, "application/json")
            .header(TIMESTAMP_HEADER, request.timestamp.to_string())
            .header(SIGNATURE_HEADER, &request.signature)
            .body(request.body)
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, url = %request.url, "Sync request failed");
                SyncError::Transport(e)
            })?;

        let status = response.status().as_u16();
        let text = response.text().await.map_err(|e| {
            error!(error = %e, status, "Failed to read sync response body");
            SyncError::Transport(e)
        })?;

        if status != 200 {
            warn!(status, "Store rejected sync");
            return Err(SyncError::Http {
                status,
                details: ErrorDetails::from_body(&text),
            });
        }

        match serde_json::from_str::<Value>(&text) {
            Ok(body) => {
                info!(status, "Customer synced");
                Ok(SyncResponse { status, body })
            }
            Err(e) => {
                warn!(error = %e, "Store returned invalid JSON");
                Err(SyncError::InvalidJson { status, raw: text })
            }
        }
    }

    fn resolve(&self, store_id: &str) -> Result<&ShopConfig, SyncError> {
        let shop = self
            .inner
            .directory
            .get(store_id)
            .ok_or_else(|| SyncError::UnknownStore(store_id.to_string()))?;

        let base_url = shop.trimmed_base_url();
        let plain_http_ok = self.inner.settings.allow_plain_http && base_url.starts_with("http://");
        if !base_url.starts_with("https://") && !plain_http_ok {
            return Err(SyncError::InsecureBaseUrl {
                store: shop.id.clone(),
            });
        }

        if !shop.has_secret() {
            return Err(SyncError::MissingSecret {
                store: shop.id.clone(),
            });
        }

        Ok(shop)
    }
}

/// Flatten a sync result into `(status, body)`.
///
/// Success yields the store's status and body; failure yields
/// [`SyncError::status`] and [`SyncError::to_json`].
#[must_use]
pub fn status_and_body(result: &Result<SyncResponse, SyncError>) -> (u16, Value) {
    match result {
        Ok(response) => (response.status, response.body.clone()),
        Err(err) => (err.status(), err.to_json()),
    }
}
