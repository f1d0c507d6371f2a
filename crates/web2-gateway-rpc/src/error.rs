//! RPC error types.

use std::path::PathBuf;

/// Errors produced by the RPC clients.
#[derive(Debug, thiserror::Error)]
pub enum RpcError {
    /// The client certificate or key could not be read or parsed.
    #[error("certificate error at {path}: {reason}")]
    Certificate {
        /// File that failed to load.
        path: PathBuf,
        /// Underlying cause.
        reason: String,
    },

    /// The request could not be delivered or its response not read.
    #[error("rpc transport error calling {endpoint}: {source}")]
    Transport {
        /// Endpoint that was called.
        endpoint: String,
        /// Underlying HTTP client error.
        #[source]
        source: reqwest::Error,
    },

    /// The service answered with `success: false`.
    #[error("rpc {endpoint} rejected: {message}")]
    Rejected {
        /// Endpoint that was called.
        endpoint: String,
        /// Error message reported by the service, if any.
        message: String,
    },

    /// The response body did not have the expected shape.
    #[error("rpc {endpoint} returned an unexpected response: {reason}")]
    Decode {
        /// Endpoint that was called.
        endpoint: String,
        /// What was wrong with the body.
        reason: String,
    },

    /// Transactions stayed unconfirmed for every polling attempt.
    #[error("transactions still unconfirmed after {attempts} attempts")]
    ConfirmationTimeout {
        /// Number of probes performed.
        attempts: u32,
    },
}

impl RpcError {
    /// Whether the service itself answered (as opposed to a channel failure).
    #[must_use]
    pub fn is_rejection(&self) -> bool {
        matches!(self, Self::Rejected { .. })
    }
}

/// Convenience result type for RPC operations.
pub type RpcResult<T> = Result<T, RpcError>;
