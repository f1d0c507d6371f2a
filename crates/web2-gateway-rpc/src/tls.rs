//! Client identity loading.
//!
//! The node's RPC services only accept callers presenting the private
//! DataLayer certificate. Loading happens once at startup; a missing or
//! unreadable pair is fatal.

use std::path::Path;

use reqwest::Identity;
use tracing::debug;

use crate::error::{RpcError, RpcResult};

/// Load a client identity from a PEM certificate and PEM private key.
///
/// # Errors
///
/// Returns [`RpcError::Certificate`] if either file cannot be read or the
/// pair does not form a valid identity.
pub fn load_identity(cert_path: &Path, key_path: &Path) -> RpcResult<Identity> {
    let mut pem = read_pem(cert_path)?;
    pem.push(b'\n');
    pem.extend_from_slice(&read_pem(key_path)?);

    let identity = Identity::from_pem(&pem).map_err(|e| RpcError::Certificate {
        path: cert_path.to_path_buf(),
        reason: e.to_string(),
    })?;
    debug!(cert = %cert_path.display(), key = %key_path.display(), "loaded rpc client identity");
    Ok(identity)
}

fn read_pem(path: &Path) -> RpcResult<Vec<u8>> {
    std::fs::read(path).map_err(|e| RpcError::Certificate {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}
