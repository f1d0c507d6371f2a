//! Mutual-TLS JSON-RPC clients for the Chia services the gateway talks to.
//!
//! Both the DataLayer and the wallet expose `POST {host}/{endpoint}` with a
//! JSON body and answer with a JSON object carrying a `success` flag. The
//! node authenticates callers by client certificate, so every client here
//! is built from the node's private DataLayer certificate pair.
//!
//! [`DataLayerRpcClient`] implements the core
//! [`DataLayerStore`](web2_gateway_core::DataLayerStore) boundary and
//! [`WalletRpcClient`] implements
//! [`DepositAddressSource`](web2_gateway_core::DepositAddressSource).

pub mod client;
pub mod confirm;
pub mod datalayer;
pub mod error;
pub mod tls;
pub mod wallet;

pub use client::RpcClient;
pub use confirm::{ConfirmationPolicy, wait_for_confirmation};
pub use datalayer::DataLayerRpcClient;
pub use error::RpcError;
pub use tls::load_identity;
pub use wallet::WalletRpcClient;
