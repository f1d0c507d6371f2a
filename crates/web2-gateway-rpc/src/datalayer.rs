//! DataLayer RPC client.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};
use web2_gateway_core::{DataLayerStore, StoreId, StoreLookup};

use crate::client::RpcClient;
use crate::error::{RpcError, RpcResult};

const GET_VALUE: &str = "get_value";
const GET_KEYS: &str = "get_keys";
const GET_ROUTES: &str = "get_routes";

#[derive(Debug, Serialize)]
struct GetValueRequest<'a> {
    id: &'a str,
    key: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    root_hash: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct GetKeysRequest<'a> {
    id: &'a str,
}

#[derive(Debug, Deserialize)]
struct GetValueResponse {
    value: String,
}

#[derive(Debug, Deserialize)]
struct GetKeysResponse {
    keys: Vec<String>,
}

/// Client for the node's DataLayer RPC service.
#[derive(Debug, Clone)]
pub struct DataLayerRpcClient {
    rpc: RpcClient,
}

impl DataLayerRpcClient {
    /// Wrap an RPC client pointed at the DataLayer host.
    #[must_use]
    pub fn new(rpc: RpcClient) -> Self {
        Self { rpc }
    }

    /// Fetch one hex-encoded value.
    ///
    /// # Errors
    ///
    /// Any [`RpcError`]; a missing key or store is [`RpcError::Rejected`].
    pub async fn get_value(
        &self,
        store_id: &str,
        hex_key: &str,
        root_hash: Option<&str>,
    ) -> RpcResult<String> {
        let request = GetValueRequest {
            id: store_id,
            key: hex_key,
            root_hash,
        };
        let response: GetValueResponse = self.rpc.call_checked(GET_VALUE, &request).await?;
        Ok(response.value)
    }

    /// List every hex-encoded key of a store.
    ///
    /// # Errors
    ///
    /// Any [`RpcError`]; an unknown store is [`RpcError::Rejected`].
    pub async fn get_keys(&self, store_id: &str) -> RpcResult<Vec<String>> {
        let response: GetKeysResponse = self
            .rpc
            .call_checked(GET_KEYS, &GetKeysRequest { id: store_id })
            .await?;
        Ok(response.keys)
    }

    /// Probe the service with `get_routes`.
    ///
    /// Any well-formed answer counts, whatever its `success` value.
    pub async fn routes_available(&self) -> bool {
        match self.rpc.call(GET_ROUTES, &serde_json::json!({})).await {
            Ok(value) => answered(&value),
            Err(e) => {
                warn!(error = %e, "datalayer availability probe failed");
                false
            }
        }
    }
}

/// Whether a response carries a `success` flag at all.
fn answered(value: &Value) -> bool {
    value.get("success").is_some()
}

/// Collapse an RPC outcome into the store boundary's three-way result.
fn into_lookup<T>(result: RpcResult<T>, store_id: &StoreId, what: &str) -> StoreLookup<T> {
    match result {
        Ok(v) => StoreLookup::Found(v),
        Err(RpcError::Rejected { message, .. }) => {
            debug!(%store_id, what, reason = %message, "datalayer reported failure");
            StoreLookup::NotFound
        }
        Err(e) => {
            warn!(%store_id, what, error = %e, "datalayer call failed");
            StoreLookup::TransportError(e.to_string())
        }
    }
}

#[async_trait]
impl DataLayerStore for DataLayerRpcClient {
    async fn fetch_value(
        &self,
        store_id: &StoreId,
        hex_key: &str,
        root_hash: Option<&str>,
    ) -> StoreLookup<String> {
        into_lookup(
            self.get_value(store_id.as_str(), hex_key, root_hash).await,
            store_id,
            GET_VALUE,
        )
    }

    async fn list_keys(&self, store_id: &StoreId) -> StoreLookup<Vec<String>> {
        into_lookup(self.get_keys(store_id.as_str()).await, store_id, GET_KEYS)
    }

    async fn is_available(&self) -> bool {
        self.routes_available().await
    }
}
