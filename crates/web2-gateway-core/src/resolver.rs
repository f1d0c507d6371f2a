//! Key and store-root resolution.

use std::sync::Arc;

use bytes::Bytes;
use tracing::{debug, warn};

use crate::cache::CompositeCache;
use crate::classify::{Classification, classify};
use crate::error::{GatewayError, GatewayResult};
use crate::hex;
use crate::manifest::CompositeManifest;
use crate::multipart::MultipartResolver;
use crate::site::{self, INDEX_KEY};
use crate::store::{DataLayerStore, StoreId, StoreLookup};

/// A key resolved into servable content.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedResource {
    /// Decoded key that was requested.
    pub key: String,
    /// How the content should be served.
    pub classification: Classification,
    /// Whether the value was assembled from a composite manifest.
    pub composite: bool,
}

/// What a store root request resolves to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreRoot {
    /// The store carries `index.html`: serve it as a website.
    Website(String),
    /// Plain key listing, decoded.
    Keys(Vec<String>),
}

/// Resolves keys against a [`DataLayerStore`], transparently assembling
/// composites.
#[derive(Debug, Clone)]
pub struct ResourceResolver {
    store: Arc<dyn DataLayerStore>,
    multipart: MultipartResolver,
}

impl ResourceResolver {
    /// Create a resolver over `store` sharing `cache` for composites.
    #[must_use]
    pub fn new(
        store: Arc<dyn DataLayerStore>,
        cache: Arc<CompositeCache>,
        max_concurrent_fetches: usize,
    ) -> Self {
        let multipart = MultipartResolver::new(Arc::clone(&store), cache, max_concurrent_fetches);
        Self { store, multipart }
    }

    /// The underlying store.
    #[must_use]
    pub fn store(&self) -> &Arc<dyn DataLayerStore> {
        &self.store
    }

    /// The composite cache shared by this resolver.
    #[must_use]
    pub fn cache(&self) -> &Arc<CompositeCache> {
        self.multipart.cache()
    }

    /// Resolve `key` into classified content.
    pub async fn resolve_key(
        &self,
        store_id: &StoreId,
        key: &str,
        root_hash: Option<&str>,
    ) -> GatewayResult<ResolvedResource> {
        let (bytes, composite) = self.fetch_bytes(store_id, key, root_hash).await?;
        Ok(ResolvedResource {
            key: key.to_owned(),
            classification: classify(bytes, key),
            composite,
        })
    }

    /// Fetch the decoded bytes stored under `key`, assembling composites.
    ///
    /// Returns the bytes and whether they came from a composite.
    pub async fn fetch_bytes(
        &self,
        store_id: &StoreId,
        key: &str,
        root_hash: Option<&str>,
    ) -> GatewayResult<(Bytes, bool)> {
        let hex_value = match self
            .store
            .fetch_value(store_id, &hex::encode(key), root_hash)
            .await
        {
            StoreLookup::Found(value) => value,
            StoreLookup::NotFound => {
                debug!(%store_id, key, "key not found");
                return Err(GatewayError::NotFound {
                    store_id: store_id.to_string(),
                    key: key.to_owned(),
                });
            }
            StoreLookup::TransportError(reason) => {
                warn!(%store_id, key, error = %reason, "value fetch failed");
                return Err(GatewayError::Unavailable(reason));
            }
        };

        let payload = Bytes::from(hex::decode_bytes(&hex_value));
        match CompositeManifest::parse(&payload) {
            Some(manifest) => {
                let assembled = self
                    .multipart
                    .resolve(store_id, key, &manifest, root_hash)
                    .await?;
                Ok((assembled.bytes.clone(), true))
            }
            None => Ok((payload, false)),
        }
    }

    /// List every key of a store, decoded.
    pub async fn list_keys(&self, store_id: &StoreId) -> GatewayResult<Vec<String>> {
        match self.store.list_keys(store_id).await {
            StoreLookup::Found(keys) => Ok(keys.iter().map(|k| hex::decode(k)).collect()),
            StoreLookup::NotFound => Err(GatewayError::NotFound {
                store_id: store_id.to_string(),
                key: String::new(),
            }),
            StoreLookup::TransportError(reason) => {
                warn!(%store_id, error = %reason, "key listing failed");
                Err(GatewayError::Unavailable(reason))
            }
        }
    }

    /// Resolve a store root: the website entry page when `index.html`
    /// exists and `show_keys` is off, otherwise the key listing.
    pub async fn resolve_store_root(
        &self,
        store_id: &StoreId,
        show_keys: bool,
    ) -> GatewayResult<StoreRoot> {
        let keys = self.list_keys(store_id).await?;
        if show_keys || !keys.iter().any(|k| k == INDEX_KEY) {
            return Ok(StoreRoot::Keys(keys));
        }

        let (bytes, _) = self.fetch_bytes(store_id, INDEX_KEY, None).await?;
        let html = String::from_utf8_lossy(&bytes);
        Ok(StoreRoot::Website(site::inject_base_href(
            &html,
            store_id.as_str(),
        )))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use super::*;

    #[derive(Default)]
    struct MemoryStore {
        values: HashMap<String, String>,
        offline: bool,
        fetches: AtomicUsize,
    }

    impl MemoryStore {
        fn put(mut self, key: &str, value: &[u8]) -> Self {
            self.values.insert(hex::encode(key), ::hex::encode(value));
            self
        }
    }

    #[async_trait]
    impl DataLayerStore for MemoryStore {
        async fn fetch_value(
            &self,
            _store_id: &StoreId,
            hex_key: &str,
            _root_hash: Option<&str>,
        ) -> StoreLookup<String> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            if self.offline {
                return StoreLookup::TransportError("connection refused".to_owned());
            }
            self.values
                .get(hex_key)
                .map_or(StoreLookup::NotFound, |v| StoreLookup::Found(v.clone()))
        }

        async fn list_keys(&self, _store_id: &StoreId) -> StoreLookup<Vec<String>> {
            if self.offline {
                return StoreLookup::TransportError("connection refused".to_owned());
            }
            let mut keys: Vec<String> = self.values.keys().cloned().collect();
            keys.sort();
            StoreLookup::Found(keys)
        }

        async fn is_available(&self) -> bool {
            !self.offline
        }
    }

    fn resolver(store: MemoryStore) -> (ResourceResolver, Arc<MemoryStore>) {
        let store = Arc::new(store);
        let resolver = ResourceResolver::new(
            Arc::clone(&store) as Arc<dyn DataLayerStore>,
            Arc::new(CompositeCache::new()),
            8,
        );
        (resolver, store)
    }

    fn store_id() -> StoreId {
        StoreId::new("abc")
    }

    #[tokio::test]
    async fn test_should_resolve_typed_file_by_extension() {
        let (resolver, _) = resolver(MemoryStore::default().put("data.txt", br#"{"a":1}"#));

        let resolved = resolver
            .resolve_key(&store_id(), "data.txt", None)
            .await
            .expect("resolved");

        assert!(!resolved.composite);
        assert_eq!(
            resolved.classification,
            Classification::TypedFile {
                bytes: Bytes::from_static(br#"{"a":1}"#),
                mime_type: "text/plain",
            }
        );
    }

    #[tokio::test]
    async fn test_should_resolve_extensionless_json() {
        let (resolver, _) = resolver(MemoryStore::default().put("config", br#"{"a":1}"#));

        let resolved = resolver
            .resolve_key(&store_id(), "config", None)
            .await
            .expect("resolved");

        assert_eq!(
            resolved.classification,
            Classification::Json(serde_json::json!({"a": 1}))
        );
    }

    #[tokio::test]
    async fn test_should_assemble_composite_under_manifest_key() {
        let store = MemoryStore::default()
            .put(
                "page.html",
                br#"{"type":"multipart","parts":["page.html.part2","page.html.part1"]}"#,
            )
            .put("page.html.part1", b"<h1>")
            .put("page.html.part2", b"hi</h1>");
        let (resolver, store) = resolver(store);

        let resolved = resolver
            .resolve_key(&store_id(), "page.html", None)
            .await
            .expect("resolved");
        assert!(resolved.composite);
        assert_eq!(
            resolved.classification,
            Classification::TypedFile {
                bytes: Bytes::from_static(b"<h1>hi</h1>"),
                mime_type: "text/html",
            }
        );
        assert_eq!(store.fetches.load(Ordering::SeqCst), 3);

        resolver
            .resolve_key(&store_id(), "page.html", None)
            .await
            .expect("cached");
        // Only the manifest is fetched again.
        assert_eq!(store.fetches.load(Ordering::SeqCst), 4);
        assert_eq!(resolver.cache().len(), 1);
    }

    fn assert_send<T: Send>(_: &T) {}

    #[test]
    fn test_should_produce_send_futures() {
        let (resolver, _) = resolver(MemoryStore::default());
        let store_id = store_id();

        assert_send(&resolver.resolve_key(&store_id, "page.html", None));
        assert_send(&resolver.resolve_store_root(&store_id, false));
    }

    #[tokio::test]
    async fn test_should_report_missing_key() {
        let (resolver, _) = resolver(MemoryStore::default());
        let err = resolver
            .resolve_key(&store_id(), "nope.css", None)
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::NotFound { key, .. } if key == "nope.css"));
    }

    #[tokio::test]
    async fn test_should_report_unavailable_store() {
        let (resolver, _) = resolver(MemoryStore {
            offline: true,
            ..MemoryStore::default()
        });
        let err = resolver
            .resolve_key(&store_id(), "a.css", None)
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::Unavailable(_)));
        assert!(matches!(
            resolver.resolve_store_root(&store_id(), false).await,
            Err(GatewayError::Unavailable(_))
        ));
    }

    #[tokio::test]
    async fn test_should_serve_index_with_base_href() {
        let (resolver, _) = resolver(
            MemoryStore::default()
                .put("index.html", b"<html><head></head></html>")
                .put("app.js", b"x"),
        );

        let root = resolver
            .resolve_store_root(&store_id(), false)
            .await
            .expect("root");

        assert_eq!(
            root,
            StoreRoot::Website(r#"<html><head><base href="/abc/"></head></html>"#.to_owned())
        );
    }

    #[tokio::test]
    async fn test_should_list_keys_when_requested_or_without_index() {
        let (with_index, _) = resolver(
            MemoryStore::default()
                .put("index.html", b"<head></head>")
                .put("a.js", b"x"),
        );
        let listed = with_index
            .resolve_store_root(&store_id(), true)
            .await
            .expect("listing");
        let StoreRoot::Keys(mut keys) = listed else {
            panic!("expected listing");
        };
        keys.sort();
        assert_eq!(keys, ["a.js", "index.html"]);

        let (plain, _) = resolver(MemoryStore::default().put("notes.md", b"x"));
        assert_eq!(
            plain
                .resolve_store_root(&store_id(), false)
                .await
                .expect("listing"),
            StoreRoot::Keys(vec!["notes.md".to_owned()])
        );
    }
}
