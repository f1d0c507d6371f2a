//! Shared JSON-RPC transport.

use std::time::Duration;

use reqwest::Identity;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use crate::error::{RpcError, RpcResult};

/// A certificate-authenticated JSON-RPC client bound to one service host.
#[derive(Debug, Clone)]
pub struct RpcClient {
    http: reqwest::Client,
    host: String,
}

impl RpcClient {
    /// Build a client for `host` presenting `identity`, with a fixed
    /// per-call `timeout`.
    ///
    /// The node serves RPC with a certificate signed by its own private CA,
    /// so server certificate verification is disabled; the caller is
    /// authenticated by its client certificate.
    ///
    /// # Errors
    ///
    /// Returns [`RpcError::Transport`] if the TLS backend rejects the
    /// configuration.
    pub fn new(host: impl Into<String>, identity: Identity, timeout: Duration) -> RpcResult<Self> {
        let http = reqwest::Client::builder()
            .use_rustls_tls()
            .identity(identity)
            .danger_accept_invalid_certs(true)
            .timeout(timeout)
            .build()
            .map_err(|source| RpcError::Transport {
                endpoint: "client setup".to_owned(),
                source,
            })?;
        Ok(Self::with_http(host, http))
    }

    /// Wrap a preconfigured `reqwest` client.
    #[must_use]
    pub fn with_http(host: impl Into<String>, http: reqwest::Client) -> Self {
        let host = host.into();
        Self {
            http,
            host: host.trim_end_matches('/').to_owned(),
        }
    }

    /// Base URL of the service.
    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Full URL of `endpoint`.
    #[must_use]
    pub fn url(&self, endpoint: &str) -> String {
        format!("{}/{endpoint}", self.host)
    }

    /// POST `body` to `endpoint` and return the raw JSON response.
    ///
    /// # Errors
    ///
    /// Returns [`RpcError::Transport`] on connection, TLS, timeout or body
    /// read failures.
    pub async fn call<B>(&self, endpoint: &str, body: &B) -> RpcResult<Value>
    where
        B: Serialize + ?Sized + Sync,
    {
        let transport = |source| RpcError::Transport {
            endpoint: endpoint.to_owned(),
            source,
        };
        debug!(endpoint, host = %self.host, "rpc call");
        let response = self
            .http
            .post(self.url(endpoint))
            .json(body)
            .send()
            .await
            .map_err(transport)?;
        response.json::<Value>().await.map_err(transport)
    }

    /// POST `body` to `endpoint`, require `success: true`, and decode the
    /// response into `T`.
    ///
    /// # Errors
    ///
    /// Returns [`RpcError::Rejected`] when the service reports failure and
    /// [`RpcError::Decode`] when the response has an unexpected shape.
    pub async fn call_checked<B, T>(&self, endpoint: &str, body: &B) -> RpcResult<T>
    where
        B: Serialize + ?Sized + Sync,
        T: DeserializeOwned,
    {
        let value = self.call(endpoint, body).await?;
        decode_success(endpoint, value)
    }
}

/// Check the `success` flag of an RPC response.
///
/// # Errors
///
/// [`RpcError::Rejected`] for `success: false`, [`RpcError::Decode`] when
/// the flag is missing.
pub fn check_success(endpoint: &str, value: &Value) -> RpcResult<()> {
    match value.get("success").and_then(Value::as_bool) {
        Some(true) => Ok(()),
        Some(false) => Err(RpcError::Rejected {
            endpoint: endpoint.to_owned(),
            message: value
                .get("error")
                .and_then(Value::as_str)
                .unwrap_or("unknown error")
                .to_owned(),
        }),
        None => Err(RpcError::Decode {
            endpoint: endpoint.to_owned(),
            reason: "missing success flag".to_owned(),
        }),
    }
}

/// Check the `success` flag and decode the response into `T`.
///
/// # Errors
///
/// See [`check_success`]; also [`RpcError::Decode`] if `T` does not match.
pub fn decode_success<T: DeserializeOwned>(endpoint: &str, value: Value) -> RpcResult<T> {
    check_success(endpoint, &value)?;
    serde_json::from_value(value).map_err(|e| RpcError::Decode {
        endpoint: endpoint.to_owned(),
        reason: e.to_string(),
    })
}
