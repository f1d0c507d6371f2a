//! Multipart composite resolution.
//!
//! Given a manifest, fetches every part concurrently (bounded), joins the
//! hex-encoded values in ascending part order, and decodes the joined hex
//! once. Decoding after concatenation keeps multi-byte sequences that
//! straddle a part boundary intact.

use std::sync::Arc;

use bytes::Bytes;
use futures::{StreamExt, TryStreamExt, stream};
use tracing::{debug, info, warn};

use crate::cache::{AssembledResource, CompositeCache};
use crate::error::{GatewayError, GatewayResult};
use crate::hex;
use crate::manifest::CompositeManifest;
use crate::store::{DataLayerStore, StoreId, StoreLookup};

/// Default upper bound on concurrent part fetches.
pub const DEFAULT_MAX_CONCURRENT_FETCHES: usize = 32;

/// Resolves composite manifests into assembled resources.
#[derive(Debug, Clone)]
pub struct MultipartResolver {
    store: Arc<dyn DataLayerStore>,
    cache: Arc<CompositeCache>,
    max_concurrent_fetches: usize,
}

impl MultipartResolver {
    /// Create a resolver over `store`, memoizing into `cache`.
    #[must_use]
    pub fn new(
        store: Arc<dyn DataLayerStore>,
        cache: Arc<CompositeCache>,
        max_concurrent_fetches: usize,
    ) -> Self {
        Self {
            store,
            cache,
            max_concurrent_fetches: max_concurrent_fetches.max(1),
        }
    }

    /// The cache this resolver fills.
    #[must_use]
    pub fn cache(&self) -> &Arc<CompositeCache> {
        &self.cache
    }

    /// Cache key for `manifest`, scoped by `root_hash` for historical reads.
    #[must_use]
    pub fn cache_key(manifest: &CompositeManifest, root_hash: Option<&str>) -> String {
        match root_hash {
            Some(root) => format!("{root}@{}", manifest.cache_key()),
            None => manifest.cache_key(),
        }
    }

    /// Resolve `manifest`, stored under `manifest_key`, into its assembled bytes.
    ///
    /// A cache hit performs no store calls. If any part fails the whole
    /// resolution fails and nothing is cached.
    pub async fn resolve(
        &self,
        store_id: &StoreId,
        manifest_key: &str,
        manifest: &CompositeManifest,
        root_hash: Option<&str>,
    ) -> GatewayResult<Arc<AssembledResource>> {
        let cache_key = Self::cache_key(manifest, root_hash);

        self.cache
            .get_or_try_assemble(&cache_key, || async {
                let ordered = manifest.ordered_parts()?;
                debug!(
                    %store_id,
                    key = manifest_key,
                    parts = ordered.len(),
                    "assembling composite"
                );
                let joined = self.fetch_parts(store_id, &ordered, root_hash).await?;
                let bytes = Bytes::from(hex::decode_bytes(&joined));
                info!(
                    %store_id,
                    key = manifest_key,
                    cache_key = %cache_key,
                    size = bytes.len(),
                    "assembled composite"
                );
                Ok(AssembledResource {
                    cache_key: cache_key.clone(),
                    bytes,
                })
            })
            .await
    }

    /// Fetch all parts and join their hex values in the given order.
    async fn fetch_parts(
        &self,
        store_id: &StoreId,
        ordered: &[String],
        root_hash: Option<&str>,
    ) -> GatewayResult<String> {
        // Collected up front: a lazy `map` here makes the future non-`Send`.
        let fetches: Vec<_> = ordered
            .iter()
            .map(|part| self.fetch_part(store_id, part, root_hash))
            .collect();

        // `buffered` yields results in input order regardless of completion order.
        let values: Vec<String> = stream::iter(fetches)
            .buffered(self.max_concurrent_fetches)
            .try_collect()
            .await?;

        let mut joined = String::with_capacity(values.iter().map(String::len).sum());
        for value in &values {
            joined.push_str(hex::strip_prefix(value));
        }
        Ok(joined)
    }

    async fn fetch_part(
        &self,
        store_id: &StoreId,
        part: &str,
        root_hash: Option<&str>,
    ) -> GatewayResult<String> {
        match self
            .store
            .fetch_value(store_id, &hex::encode(part), root_hash)
            .await
        {
            StoreLookup::Found(value) => Ok(value),
            StoreLookup::NotFound => {
                warn!(%store_id, part, "composite part not found");
                Err(GatewayError::CompositePart {
                    part: part.to_owned(),
                    reason: "not found".to_owned(),
                })
            }
            StoreLookup::TransportError(reason) => {
                warn!(%store_id, part, error = %reason, "composite part fetch failed");
                Err(GatewayError::CompositePart {
                    part: part.to_owned(),
                    reason,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;

    use super::*;

    /// Store fake whose later parts answer sooner, to shake out ordering bugs.
    #[derive(Default)]
    struct FakeStore {
        values: HashMap<String, String>,
        fetches: AtomicUsize,
        seen_roots: Mutex<Vec<Option<String>>>,
    }

    impl FakeStore {
        fn with(entries: &[(&str, &str)]) -> Self {
            Self {
                values: entries
                    .iter()
                    .map(|(k, v)| (hex::encode(k), hex::encode(v)))
                    .collect(),
                ..Self::default()
            }
        }
    }

    #[async_trait]
    impl DataLayerStore for FakeStore {
        async fn fetch_value(
            &self,
            _store_id: &StoreId,
            hex_key: &str,
            root_hash: Option<&str>,
        ) -> StoreLookup<String> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            self.seen_roots
                .lock()
                .expect("lock")
                .push(root_hash.map(str::to_owned));
            let key = hex::decode(hex_key);
            let delay = manifest_delay(&key);
            tokio::time::sleep(Duration::from_millis(delay)).await;
            match self.values.get(hex_key) {
                Some(v) => StoreLookup::Found(v.clone()),
                None => StoreLookup::NotFound,
            }
        }

        async fn list_keys(&self, _store_id: &StoreId) -> StoreLookup<Vec<String>> {
            StoreLookup::Found(self.values.keys().cloned().collect())
        }

        async fn is_available(&self) -> bool {
            true
        }
    }

    fn manifest_delay(key: &str) -> u64 {
        crate::manifest::part_index(key).map_or(0, |idx| 30u64.saturating_sub(idx * 2))
    }

    fn resolver(store: Arc<FakeStore>) -> MultipartResolver {
        MultipartResolver::new(store, Arc::new(CompositeCache::new()), 4)
    }

    fn manifest(parts: &[&str]) -> CompositeManifest {
        CompositeManifest::new(parts.iter().map(|p| (*p).to_owned()).collect())
    }

    #[tokio::test]
    async fn test_should_concatenate_in_numeric_part_order() {
        let store = Arc::new(FakeStore::with(&[
            ("a.part1", "one-"),
            ("a.part2", "two-"),
            ("a.part10", "ten"),
        ]));
        let resolver = resolver(Arc::clone(&store));

        let assembled = resolver
            .resolve(
                &StoreId::new("s"),
                "a.txt",
                &manifest(&["a.part10", "a.part2", "a.part1"]),
                None,
            )
            .await
            .expect("assembled");

        assert_eq!(&assembled.bytes[..], b"one-two-ten");
        assert_eq!(assembled.cache_key, "a.part1,a.part10,a.part2");
    }

    #[tokio::test]
    async fn test_should_decode_after_concatenating_hex() {
        // "é" is 0xc3 0xa9; split it across two parts.
        let mut store = FakeStore::default();
        store.values.insert(hex::encode("e.part1"), "68c3".to_owned());
        store.values.insert(hex::encode("e.part2"), "0xa969".to_owned());
        let resolver = resolver(Arc::new(store));

        let assembled = resolver
            .resolve(&StoreId::new("s"), "e", &manifest(&["e.part1", "e.part2"]), None)
            .await
            .expect("assembled");

        assert_eq!(std::str::from_utf8(&assembled.bytes).expect("utf8"), "héi");
    }

    fn assert_send<T: Send>(_: &T) {}

    #[test]
    fn test_should_produce_send_futures() {
        let resolver = resolver(Arc::new(FakeStore::default()));
        let store_id = StoreId::new("s");
        let m = manifest(&["a.part1"]);

        // Served from hyper's multi-threaded executor.
        assert_send(&resolver.resolve(&store_id, "a", &m, None));
        assert_send(&resolver.resolve(&store_id, "a", &m, Some("0x01")));
    }

    #[tokio::test]
    async fn test_should_serve_cache_hit_without_fetching() {
        let store = Arc::new(FakeStore::with(&[("x.part1", "x"), ("y.part2", "y")]));
        let resolver = resolver(Arc::clone(&store));
        let store_id = StoreId::new("s");

        resolver
            .resolve(&store_id, "xy.bin", &manifest(&["x.part1", "y.part2"]), None)
            .await
            .expect("first");
        assert_eq!(store.fetches.load(Ordering::SeqCst), 2);

        let again = resolver
            .resolve(&store_id, "xy.bin", &manifest(&["y.part2", "x.part1"]), None)
            .await
            .expect("second");
        assert_eq!(&again.bytes[..], b"xy");
        assert_eq!(store.fetches.load(Ordering::SeqCst), 2);
        assert_eq!(resolver.cache().len(), 1);
    }

    #[tokio::test]
    async fn test_should_fail_and_cache_nothing_when_a_part_is_missing() {
        let store = Arc::new(FakeStore::with(&[("b.part1", "x")]));
        let resolver = resolver(Arc::clone(&store));

        let err = resolver
            .resolve(&StoreId::new("s"), "b", &manifest(&["b.part1", "b.part2"]), None)
            .await
            .unwrap_err();

        assert!(matches!(err, GatewayError::CompositePart { part, .. } if part == "b.part2"));
        assert!(resolver.cache().is_empty());
    }

    #[tokio::test]
    async fn test_should_scope_cache_key_and_forward_root_hash() {
        let store = Arc::new(FakeStore::with(&[("c.part1", "c")]));
        let resolver = resolver(Arc::clone(&store));
        let m = manifest(&["c.part1"]);

        let assembled = resolver
            .resolve(&StoreId::new("s"), "c", &m, Some("0xabc"))
            .await
            .expect("assembled");

        assert_eq!(assembled.cache_key, "0xabc@c.part1");
        assert!(!resolver.cache().contains("c.part1"));
        assert_eq!(
            store.seen_roots.lock().expect("lock").as_slice(),
            [Some("0xabc".to_owned())]
        );
    }
}
