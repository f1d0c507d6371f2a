//! Web2 Gateway - serves Chia DataLayer stores over plain HTTP.
//!
//! # Usage
//!
//! ```text
//! WEB2_GATEWAY_PORT=41410 web2-gateway
//! web2-gateway --health-check
//! ```
//!
//! # Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `WEB2_BIND_ADDRESS` | `localhost` | Bind host |
//! | `WEB2_GATEWAY_PORT` | `41410` | Bind port |
//! | `DATALAYER_HOST` | `https://localhost:8562` | DataLayer RPC endpoint |
//! | `WALLET_HOST` | `https://localhost:9256` | Wallet RPC endpoint |
//! | `CHIA_ROOT` | `~/.chia/mainnet` | Node root directory |
//! | `CERTIFICATE_FOLDER_PATH` | `$CHIA_ROOT/config/ssl` | Node SSL folder |
//! | `DEFAULT_WALLET_ID` | `1` | Wallet for deposit addresses |
//! | `RPC_TIMEOUT_SECS` | `300` | Per-call RPC timeout |
//! | `MAX_CONCURRENT_PART_FETCHES` | `32` | Part fetch concurrency per composite |
//! | `DONATION_ADDRESS` | built-in | Reported by `/.well-known` |
//! | `LOG_LEVEL` | `info` | Log level filter |
//! | `RUST_LOG` | *(unset)* | Fine-grained tracing filter (overrides `LOG_LEVEL`) |

use std::future::Future;
use std::sync::Arc;

use anyhow::{Context, Result};
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as HttpConnBuilder;
use tokio::net::TcpListener;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;
use web2_gateway_core::{CompositeCache, GatewayConfig, ResourceResolver};
use web2_gateway_http::{GatewayHttpConfig, GatewayHttpService};
use web2_gateway_rpc::{DataLayerRpcClient, RpcClient, WalletRpcClient, load_identity};

/// Server version reported at startup.
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize the tracing subscriber.
///
/// Uses `RUST_LOG` if set, otherwise falls back to the `LOG_LEVEL` config value.
fn init_tracing(log_level: &str) -> Result<()> {
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        EnvFilter::try_new(log_level)
            .with_context(|| format!("invalid log level filter: {log_level}"))?
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    Ok(())
}

/// Wire RPC clients, resolver and cache into the HTTP service.
///
/// Fails on invalid configuration or when the DataLayer client certificate
/// cannot be loaded.
fn build_service(config: &GatewayConfig) -> Result<GatewayHttpService> {
    config.validate().context("invalid gateway configuration")?;

    let cert_path = config.datalayer_cert_path();
    let key_path = config.datalayer_key_path();
    let identity = load_identity(&cert_path, &key_path).with_context(|| {
        format!(
            "failed to load DataLayer client certificate from {}",
            config.certificate_folder.display()
        )
    })?;

    let datalayer = DataLayerRpcClient::new(
        RpcClient::new(
            config.datalayer_host.clone(),
            identity.clone(),
            config.rpc_timeout(),
        )
        .context("failed to build DataLayer RPC client")?,
    );
    let wallet = WalletRpcClient::new(
        RpcClient::new(config.wallet_host.clone(), identity, config.rpc_timeout())
            .context("failed to build wallet RPC client")?,
        config.default_wallet_id,
    );

    let resolver = ResourceResolver::new(
        Arc::new(datalayer),
        Arc::new(CompositeCache::new()),
        config.max_concurrent_part_fetches,
    );

    Ok(GatewayHttpService::new(
        Arc::new(resolver),
        Arc::new(wallet),
        GatewayHttpConfig {
            donation_address: config.donation_address.clone(),
        },
    ))
}

/// Resolve once ctrl-c is received.
async fn shutdown_signal() {
    tokio::signal::ctrl_c().await.ok();
    info!("received shutdown signal, draining connections");
}

/// Run the accept loop until `shutdown` resolves, then drain open connections.
async fn serve(
    listener: TcpListener,
    service: GatewayHttpService,
    shutdown: impl Future<Output = ()>,
) -> Result<()> {
    let graceful = hyper_util::server::graceful::GracefulShutdown::new();
    let http = HttpConnBuilder::new(TokioExecutor::new());

    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            result = listener.accept() => {
                let (stream, peer_addr) = match result {
                    Ok(conn) => conn,
                    Err(e) => {
                        warn!(error = %e, "failed to accept connection");
                        continue;
                    }
                };

                let conn = http.serve_connection(TokioIo::new(stream), service.clone());
                let conn = graceful.watch(conn.into_owned());

                tokio::spawn(async move {
                    if let Err(e) = conn.await {
                        error!(peer_addr = %peer_addr, error = %e, "connection error");
                    }
                });
            }

            () = &mut shutdown => {
                info!("shutting down gracefully");
                break;
            }
        }
    }

    graceful.shutdown().await;
    info!("all connections drained, exiting");

    Ok(())
}

/// Address to probe for `--health-check`: wildcard binds become loopback.
fn health_check_addr(listen_addr: &str) -> String {
    listen_addr.replace("0.0.0.0", "127.0.0.1")
}

/// State reported by a gateway's `/health` endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct HealthReport {
    /// The gateway answered with `"status": "running"`.
    running: bool,
    /// The gateway could reach its DataLayer service.
    datalayer: bool,
}

impl HealthReport {
    /// A gateway that cannot reach the DataLayer serves nothing but redirects.
    fn is_healthy(self) -> bool {
        self.running && self.datalayer
    }
}

/// Parse a raw HTTP/1.1 `/health` response into a [`HealthReport`].
fn parse_health_response(raw: &str) -> Result<HealthReport> {
    let (head, body) = raw
        .split_once("\r\n\r\n")
        .context("malformed HTTP response")?;
    let status_line = head.lines().next().unwrap_or_default();
    if status_line.split_whitespace().nth(1) != Some("200") {
        anyhow::bail!("unexpected status line: {status_line}");
    }

    let body: serde_json::Value =
        serde_json::from_str(body.trim()).context("health body is not JSON")?;
    Ok(HealthReport {
        running: body["status"] == "running",
        datalayer: body["datalayer"].as_bool().unwrap_or(false),
    })
}

/// Request `/health` from a running gateway and report what it says.
async fn run_health_check(addr: &str) -> Result<HealthReport> {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpStream;

    let mut stream = TcpStream::connect(addr)
        .await
        .with_context(|| format!("cannot connect to {addr}"))?;

    // `Connection: close` makes the server end the stream after one response.
    let request = format!("GET /health HTTP/1.1\r\nHost: {addr}\r\nConnection: close\r\n\r\n");
    stream.write_all(request.as_bytes()).await?;

    let mut response = String::new();
    stream.read_to_string(&mut response).await?;

    parse_health_response(&response).with_context(|| format!("bad health response from {addr}"))
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = GatewayConfig::from_env();
    let listen_addr = config.listen_addr();

    // Handle --health-check flag for container health probes.
    if std::env::args().any(|a| a == "--health-check") {
        let healthy = run_health_check(&health_check_addr(&listen_addr))
            .await
            .is_ok_and(HealthReport::is_healthy);
        std::process::exit(i32::from(!healthy));
    }

    init_tracing(&config.log_level)?;

    let service = build_service(&config)?;

    let listener = TcpListener::bind(&listen_addr)
        .await
        .with_context(|| format!("failed to bind to {listen_addr}"))?;

    info!(
        addr = %listen_addr,
        datalayer = %config.datalayer_host,
        wallet = %config.wallet_host,
        max_concurrent_part_fetches = config.max_concurrent_part_fetches,
        version = VERSION,
        "starting Web2 Gateway",
    );

    serve(listener, service, shutdown_signal()).await
}
