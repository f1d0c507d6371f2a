//! Gateway configuration.
//!
//! Provides [`GatewayConfig`], built once at startup from environment
//! variables and handed to every component constructor. Nothing reads the
//! environment after the listener starts.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use typed_builder::TypedBuilder;

use crate::error::{GatewayError, GatewayResult};
use crate::multipart::DEFAULT_MAX_CONCURRENT_FETCHES;

/// Donation address reported by `/.well-known` unless overridden.
pub const DEFAULT_DONATION_ADDRESS: &str =
    "xch17edp36nd9m5jfcq2sa5qp25ekrrfguvpx05zce35pf65mlvfn4gqyl0434";

/// Gateway configuration.
///
/// All fields have defaults matching a stock mainnet node running on the
/// same machine.
///
/// # Examples
///
/// ```
/// use web2_gateway_core::config::GatewayConfig;
///
/// let config = GatewayConfig::default();
/// assert_eq!(config.listen_addr(), "localhost:41410");
/// assert_eq!(config.max_concurrent_part_fetches, 32);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, TypedBuilder)]
#[serde(rename_all = "camelCase")]
pub struct GatewayConfig {
    /// Host the HTTP listener binds to.
    #[builder(default = String::from("localhost"))]
    pub bind_address: String,

    /// Port the HTTP listener binds to.
    #[builder(default = 41_410)]
    pub port: u16,

    /// Base URL of the DataLayer RPC service.
    #[builder(default = String::from("https://localhost:8562"))]
    pub datalayer_host: String,

    /// Base URL of the wallet RPC service.
    #[builder(default = String::from("https://localhost:9256"))]
    pub wallet_host: String,

    /// Folder containing the node's SSL material.
    #[builder(default = default_certificate_folder())]
    pub certificate_folder: PathBuf,

    /// Wallet used when asking for a deposit address.
    #[builder(default = 1)]
    pub default_wallet_id: u32,

    /// Fixed timeout applied to every RPC call, in seconds.
    #[builder(default = 300)]
    pub rpc_timeout_secs: u64,

    /// Upper bound on concurrent part fetches for one composite.
    #[builder(default = DEFAULT_MAX_CONCURRENT_FETCHES)]
    pub max_concurrent_part_fetches: usize,

    /// Address reported as the donation address.
    #[builder(default = String::from(DEFAULT_DONATION_ADDRESS))]
    pub donation_address: String,

    /// Log level filter string (e.g. `"info"`, `"debug"`).
    #[builder(default = String::from("info"))]
    pub log_level: String,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            bind_address: String::from("localhost"),
            port: 41_410,
            datalayer_host: String::from("https://localhost:8562"),
            wallet_host: String::from("https://localhost:9256"),
            certificate_folder: default_certificate_folder(),
            default_wallet_id: 1,
            rpc_timeout_secs: 300,
            max_concurrent_part_fetches: DEFAULT_MAX_CONCURRENT_FETCHES,
            donation_address: String::from(DEFAULT_DONATION_ADDRESS),
            log_level: String::from("info"),
        }
    }
}

impl GatewayConfig {
    /// Load configuration from environment variables.
    ///
    /// | Variable | Default |
    /// |----------|---------|
    /// | `WEB2_BIND_ADDRESS` | `localhost` |
    /// | `WEB2_GATEWAY_PORT` | `41410` |
    /// | `DATALAYER_HOST` | `https://localhost:8562` |
    /// | `WALLET_HOST` | `https://localhost:9256` |
    /// | `CERTIFICATE_FOLDER_PATH` | `$CHIA_ROOT/config/ssl` |
    /// | `DEFAULT_WALLET_ID` | `1` |
    /// | `RPC_TIMEOUT_SECS` | `300` |
    /// | `MAX_CONCURRENT_PART_FETCHES` | `32` |
    /// | `DONATION_ADDRESS` | built-in address |
    /// | `LOG_LEVEL` | `info` |
    ///
    /// Numeric values that fail to parse keep their default.
    #[must_use]
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(v) = std::env::var("WEB2_BIND_ADDRESS") {
            config.bind_address = v;
        }
        if let Some(n) = parse_env("WEB2_GATEWAY_PORT") {
            config.port = n;
        }
        if let Ok(v) = std::env::var("DATALAYER_HOST") {
            config.datalayer_host = v;
        }
        if let Ok(v) = std::env::var("WALLET_HOST") {
            config.wallet_host = v;
        }
        if let Ok(v) = std::env::var("CERTIFICATE_FOLDER_PATH") {
            config.certificate_folder = expand_home(&v);
        }
        if let Some(n) = parse_env("DEFAULT_WALLET_ID") {
            config.default_wallet_id = n;
        }
        if let Some(n) = parse_env("RPC_TIMEOUT_SECS") {
            config.rpc_timeout_secs = n;
        }
        if let Some(n) = parse_env::<usize>("MAX_CONCURRENT_PART_FETCHES") {
            config.max_concurrent_part_fetches = n.max(1);
        }
        if let Ok(v) = std::env::var("DONATION_ADDRESS") {
            config.donation_address = v;
        }
        if let Ok(v) = std::env::var("LOG_LEVEL") {
            config.log_level = v;
        }

        config
    }

    /// Reject values that would only fail later, mid-request.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Config`] for a zero port, an RPC host that is
    /// not an `http(s)://` URL, or a zero RPC timeout.
    pub fn validate(&self) -> GatewayResult<()> {
        if self.port == 0 {
            return Err(GatewayError::Config("port must be non-zero".to_owned()));
        }
        for (name, host) in [
            ("DATALAYER_HOST", &self.datalayer_host),
            ("WALLET_HOST", &self.wallet_host),
        ] {
            if !(host.starts_with("https://") || host.starts_with("http://")) {
                return Err(GatewayError::Config(format!(
                    "{name} must be an http(s) URL, got {host:?}"
                )));
            }
        }
        if self.rpc_timeout_secs == 0 {
            return Err(GatewayError::Config(
                "RPC_TIMEOUT_SECS must be non-zero".to_owned(),
            ));
        }
        Ok(())
    }

    /// The `host:port` pair the listener binds to.
    #[must_use]
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.bind_address, self.port)
    }

    /// The RPC timeout as a [`Duration`].
    #[must_use]
    pub fn rpc_timeout(&self) -> Duration {
        Duration::from_secs(self.rpc_timeout_secs)
    }

    /// Path of the DataLayer client certificate.
    #[must_use]
    pub fn datalayer_cert_path(&self) -> PathBuf {
        self.certificate_folder
            .join("data_layer")
            .join("private_data_layer.crt")
    }

    /// Path of the DataLayer client private key.
    #[must_use]
    pub fn datalayer_key_path(&self) -> PathBuf {
        self.certificate_folder
            .join("data_layer")
            .join("private_data_layer.key")
    }
}

fn parse_env<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok()?.trim().parse().ok()
}

/// Resolve the node root: `$CHIA_ROOT` or `~/.chia/mainnet`.
fn chia_root() -> PathBuf {
    match std::env::var("CHIA_ROOT") {
        Ok(root) if !root.is_empty() => expand_home(&root),
        _ => expand_home("~/.chia/mainnet"),
    }
}

fn default_certificate_folder() -> PathBuf {
    chia_root().join("config").join("ssl")
}

/// Replace a leading `~` with the user's home directory.
fn expand_home(path: &str) -> PathBuf {
    let Some(rest) = path.strip_prefix('~') else {
        return PathBuf::from(path);
    };
    let home = std::env::var("HOME").unwrap_or_default();
    PathBuf::from(format!("{home}{rest}"))
}
