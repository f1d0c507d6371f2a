//! Store client boundary.
//!
//! The remote DataLayer is consumed through [`DataLayerStore`], a narrow
//! two-call interface. Keys and values cross this boundary hex-encoded,
//! exactly as they travel on the wire; decoding happens in the resolver so
//! that composite parts can be concatenated before decoding.

use std::fmt;

use async_trait::async_trait;

/// Identifier of a remote store (the singleton launcher id).
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct StoreId(String);

impl StoreId {
    /// Create a store id from its textual form.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the store id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StoreId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Outcome of one store call.
///
/// Transport failures are kept distinct from misses for logging, but the
/// resolver treats both as "unavailable" and neither ever reaches the
/// HTTP client as a raw error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreLookup<T> {
    /// The store answered successfully.
    Found(T),
    /// The store answered but reported failure (missing key or store).
    NotFound,
    /// The call itself failed: timeout, TLS error, malformed response.
    TransportError(String),
}

/// Remote key-value store queried by the gateway.
///
/// Implementations hold no per-call state; every call is a fresh round
/// trip.
#[async_trait]
pub trait DataLayerStore: Send + Sync + 'static {
    /// Fetch one value by hex-encoded key, optionally at a historical root.
    ///
    /// On success the value is returned hex-encoded, as received.
    async fn fetch_value(
        &self,
        store_id: &StoreId,
        hex_key: &str,
        root_hash: Option<&str>,
    ) -> StoreLookup<String>;

    /// List every key of a store, hex-encoded.
    async fn list_keys(&self, store_id: &StoreId) -> StoreLookup<Vec<String>>;

    /// Whether the store service answers at all.
    async fn is_available(&self) -> bool;
}

impl fmt::Debug for dyn DataLayerStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("DataLayerStore")
    }
}
