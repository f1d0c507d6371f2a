//! Error types for the resolution engine.

/// Errors produced while resolving a key into a servable resource.
///
/// Every variant is recoverable at the request boundary: the HTTP layer
/// turns key-level failures into a redirect to the store root and
/// store-level failures into a JSON error body.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// The store or key does not exist on this node.
    #[error("key {key:?} not found in store {store_id}")]
    NotFound {
        /// Store that was queried.
        store_id: String,
        /// Decoded key that was requested.
        key: String,
    },

    /// The store RPC channel failed (timeout, TLS, connection refused).
    #[error("datalayer unavailable: {0}")]
    Unavailable(String),

    /// One part of a composite could not be fetched.
    #[error("composite part {part:?} unavailable: {reason}")]
    CompositePart {
        /// Name of the failing part.
        part: String,
        /// Why the part fetch failed.
        reason: String,
    },

    /// A manifest part name carries no `.part<N>` sequence index.
    #[error("manifest part {0:?} has no parseable .part index")]
    InvalidPartName(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Convenience result type for resolution operations.
pub type GatewayResult<T> = Result<T, GatewayError>;
