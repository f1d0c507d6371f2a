//! Bounded wait for wallet transactions to confirm.

use std::future::Future;
use std::time::Duration;

use tracing::{debug, info, warn};
use typed_builder::TypedBuilder;

use crate::error::{RpcError, RpcResult};

/// Polling schedule for [`wait_for_confirmation`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, TypedBuilder)]
pub struct ConfirmationPolicy {
    /// Delay between probes.
    #[builder(default = Duration::from_secs(5))]
    pub interval: Duration,
    /// Number of probes before giving up.
    #[builder(default = 120)]
    pub max_attempts: u32,
}

impl Default for ConfirmationPolicy {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// Poll `has_pending` until it reports no pending transactions.
///
/// A probe error counts as "still pending" and polling continues.
///
/// # Errors
///
/// Returns [`RpcError::ConfirmationTimeout`] when transactions are still
/// pending after `policy.max_attempts` probes.
pub async fn wait_for_confirmation<F, Fut>(
    policy: ConfirmationPolicy,
    mut has_pending: F,
) -> RpcResult<()>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = RpcResult<bool>>,
{
    for attempt in 1..=policy.max_attempts {
        match has_pending().await {
            Ok(false) => {
                debug!(attempt, "no unconfirmed transactions");
                return Ok(());
            }
            Ok(true) => info!(attempt, "waiting for transactions to confirm"),
            Err(e) => warn!(attempt, error = %e, "confirmation probe failed"),
        }
        if attempt < policy.max_attempts {
            tokio::time::sleep(policy.interval).await;
        }
    }
    Err(RpcError::ConfirmationTimeout {
        attempts: policy.max_attempts,
    })
}
