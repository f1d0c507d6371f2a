//! Wallet collaborator boundary used by the discovery endpoint.

use async_trait::async_trait;

/// Source of deposit addresses for `/.well-known`.
#[async_trait]
pub trait DepositAddressSource: Send + Sync + 'static {
    /// Return the node's current deposit address, or `None` if the wallet
    /// cannot be reached.
    async fn deposit_address(&self) -> Option<String>;
}
