//! Process-scoped cache of assembled composites.
//!
//! Entries are keyed by the manifest's sorted part list and live until the
//! process exits; there is no TTL and no eviction. Concurrent first-time
//! requests for the same composite share one assembly: the first caller
//! fetches and concatenates, later arrivals await its result. A failed
//! assembly leaves nothing behind.

use std::future::Future;
use std::sync::Arc;

use bytes::Bytes;
use dashmap::DashMap;
use tokio::sync::OnceCell;
use tracing::debug;

use crate::error::GatewayResult;

/// A composite concatenated from all of its parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssembledResource {
    /// Sorted-parts cache key this resource is stored under.
    pub cache_key: String,
    /// Decoded bytes of all parts, in part order.
    pub bytes: Bytes,
}

type Slot = Arc<OnceCell<Arc<AssembledResource>>>;

/// Thread-safe cache of [`AssembledResource`]s with an in-flight guard.
#[derive(Debug, Default)]
pub struct CompositeCache {
    entries: DashMap<String, Slot>,
}

impl CompositeCache {
    /// Create a new empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    /// Get a fully assembled entry, if present.
    #[must_use]
    pub fn get(&self, cache_key: &str) -> Option<Arc<AssembledResource>> {
        self.entries
            .get(cache_key)
            .and_then(|slot| slot.get().cloned())
    }

    /// Whether a fully assembled entry exists for `cache_key`.
    #[must_use]
    pub fn contains(&self, cache_key: &str) -> bool {
        self.get(cache_key).is_some()
    }

    /// Return the cached entry, or run `assemble` to produce it.
    ///
    /// At most one `assemble` runs per key at a time; concurrent callers
    /// await it. On error nothing is cached and the slot is released so a
    /// later request can retry.
    pub async fn get_or_try_assemble<F, Fut>(
        &self,
        cache_key: &str,
        assemble: F,
    ) -> GatewayResult<Arc<AssembledResource>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = GatewayResult<AssembledResource>>,
    {
        let slot: Slot = self
            .entries
            .entry(cache_key.to_owned())
            .or_default()
            .clone();

        if let Some(hit) = slot.get() {
            debug!(cache_key, "composite cache hit");
            return Ok(Arc::clone(hit));
        }

        let result = slot
            .get_or_try_init(|| async move { assemble().await.map(Arc::new) })
            .await
            .cloned();

        if result.is_err() {
            self.entries
                .remove_if(cache_key, |_, s| Arc::ptr_eq(s, &slot) && !s.initialized());
        }
        result
    }

    /// Number of fully assembled entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries
            .iter()
            .filter(|entry| entry.value().initialized())
            .count()
    }

    /// Whether the cache holds no assembled entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
