//! Wallet RPC client.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::warn;
use web2_gateway_core::DepositAddressSource;

use crate::client::{RpcClient, decode_success};
use crate::confirm::{ConfirmationPolicy, wait_for_confirmation};
use crate::error::RpcResult;

const GET_NEXT_ADDRESS: &str = "get_next_address";
const GET_TRANSACTIONS: &str = "get_transactions";

#[derive(Debug, Serialize)]
struct NextAddressRequest {
    wallet_id: u32,
    new_address: bool,
}

#[derive(Debug, Deserialize)]
struct NextAddressResponse {
    address: String,
}

#[derive(Debug, Serialize)]
struct TransactionsRequest {
    wallet_id: u32,
}

#[derive(Debug, Deserialize)]
struct TransactionsResponse {
    #[serde(default)]
    transactions: Vec<TransactionRecord>,
}

#[derive(Debug, Deserialize)]
struct TransactionRecord {
    #[serde(default)]
    confirmed: bool,
}

/// Client for the node's wallet RPC service.
#[derive(Debug, Clone)]
pub struct WalletRpcClient {
    rpc: RpcClient,
    wallet_id: u32,
}

impl WalletRpcClient {
    /// Wrap an RPC client pointed at the wallet host, operating on `wallet_id`.
    #[must_use]
    pub fn new(rpc: RpcClient, wallet_id: u32) -> Self {
        Self { rpc, wallet_id }
    }

    /// The wallet this client operates on.
    #[must_use]
    pub fn wallet_id(&self) -> u32 {
        self.wallet_id
    }

    /// Current (or, with `new_address`, a fresh) receive address.
    ///
    /// # Errors
    ///
    /// Any [`RpcError`](crate::RpcError).
    pub async fn next_address(&self, new_address: bool) -> RpcResult<String> {
        let request = NextAddressRequest {
            wallet_id: self.wallet_id,
            new_address,
        };
        let response: NextAddressResponse =
            self.rpc.call_checked(GET_NEXT_ADDRESS, &request).await?;
        Ok(response.address)
    }

    /// Whether the wallet holds any unconfirmed transaction.
    ///
    /// # Errors
    ///
    /// Any [`RpcError`](crate::RpcError).
    pub async fn has_unconfirmed_transactions(&self) -> RpcResult<bool> {
        let value = self
            .rpc
            .call(
                GET_TRANSACTIONS,
                &TransactionsRequest {
                    wallet_id: self.wallet_id,
                },
            )
            .await?;
        parse_transactions_pending(value)
    }

    /// Block until every wallet transaction is confirmed, or the policy's
    /// attempts run out.
    ///
    /// # Errors
    ///
    /// [`RpcError::ConfirmationTimeout`](crate::RpcError::ConfirmationTimeout)
    /// if transactions remain pending.
    pub async fn wait_for_confirmation(&self, policy: ConfirmationPolicy) -> RpcResult<()> {
        wait_for_confirmation(policy, || self.has_unconfirmed_transactions()).await
    }
}

fn parse_transactions_pending(value: serde_json::Value) -> RpcResult<bool> {
    let response: TransactionsResponse = decode_success(GET_TRANSACTIONS, value)?;
    Ok(response.transactions.iter().any(|tx| !tx.confirmed))
}

#[async_trait]
impl DepositAddressSource for WalletRpcClient {
    async fn deposit_address(&self) -> Option<String> {
        match self.next_address(false).await {
            Ok(address) => Some(address),
            Err(e) => {
                warn!(wallet_id = self.wallet_id, error = %e, "could not fetch deposit address");
                None
            }
        }
    }
}
