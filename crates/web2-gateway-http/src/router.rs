//! Request routing and path normalization.
//!
//! Paths map onto routes as follows:
//!
//! | Path | Route |
//! |---|---|
//! | `/` | [`GatewayRoute::Welcome`] |
//! | `/.well-known` | [`GatewayRoute::WellKnown`] |
//! | `/health`, `/_health` | [`GatewayRoute::Health`] |
//! | `/{storeId}` | [`GatewayRoute::StoreRoot`] |
//! | `/{storeId}/{key...}` | [`GatewayRoute::Resource`] |
//!
//! Keys are percent-decoded, truncated at the first `#`, and lose one
//! trailing `/`. A key that ends up empty addresses the store root.

use percent_encoding::{AsciiSet, CONTROLS, percent_decode_str, utf8_percent_encode};
use web2_gateway_core::StoreId;

const WELL_KNOWN: &str = ".well-known";
const SHOW_KEYS_PARAM: &str = "showKeys";
const ROOT_HASH_PARAM: &str = "root_hash";

/// Characters escaped when a decoded key is written back into a `Location`.
const LOCATION_ESCAPE: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// A routed gateway request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayRoute {
    /// Static discovery document.
    Welcome,
    /// Deposit and donation addresses.
    WellKnown,
    /// Liveness plus DataLayer reachability.
    Health,
    /// A store with no key: website root or key listing.
    StoreRoot {
        /// Requested store.
        store_id: StoreId,
        /// Whether the raw key listing was explicitly requested.
        show_keys: bool,
    },
    /// A key within a store.
    Resource {
        /// Requested store.
        store_id: StoreId,
        /// Decoded, normalized key.
        key: String,
        /// Historical root to read from, if any.
        root_hash: Option<String>,
    },
}

impl GatewayRoute {
    /// The store this route addresses, if any.
    #[must_use]
    pub fn store_id(&self) -> Option<&StoreId> {
        match self {
            Self::StoreRoot { store_id, .. } | Self::Resource { store_id, .. } => Some(store_id),
            Self::Welcome | Self::WellKnown | Self::Health => None,
        }
    }

    /// The key this route addresses, if any.
    #[must_use]
    pub fn key(&self) -> Option<&str> {
        match self {
            Self::Resource { key, .. } => Some(key),
            _ => None,
        }
    }
}

/// Maps request URIs to [`GatewayRoute`]s.
#[derive(Debug, Clone, Default)]
pub struct GatewayRouter;

impl GatewayRouter {
    /// Create a router.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Route a request by its URI.
    #[must_use]
    pub fn resolve<B>(&self, req: &http::Request<B>) -> GatewayRoute {
        route_uri(req.uri())
    }
}

/// Route a URI.
#[must_use]
pub fn route_uri(uri: &http::Uri) -> GatewayRoute {
    let params = parse_query_params(uri.query().unwrap_or_default());
    let (store_raw, key_raw) = split_path(uri.path());

    let Some(store_raw) = store_raw else {
        return GatewayRoute::Welcome;
    };
    let store = normalize_store_id(&decode_uri_component(store_raw));
    let key = key_raw.map(|k| normalize_key(&decode_uri_component(k)));

    match (store.as_str(), key.as_deref()) {
        ("", _) => return GatewayRoute::Welcome,
        (WELL_KNOWN, None | Some("")) => return GatewayRoute::WellKnown,
        ("health" | "_health", None | Some("")) => return GatewayRoute::Health,
        _ => {}
    }

    let store_id = StoreId::new(store);
    match key {
        Some(key) if !key.is_empty() => GatewayRoute::Resource {
            store_id,
            key,
            root_hash: query_value(&params, ROOT_HASH_PARAM)
                .filter(|v| !v.is_empty())
                .map(str::to_owned),
        },
        _ => GatewayRoute::StoreRoot {
            store_id,
            show_keys: query_value(&params, SHOW_KEYS_PARAM).is_some_and(is_truthy),
        },
    }
}

/// Split `/{store}/{rest}` into its raw (still encoded) components.
fn split_path(path: &str) -> (Option<&str>, Option<&str>) {
    let trimmed = path.strip_prefix('/').unwrap_or(path);
    if trimmed.is_empty() {
        return (None, None);
    }
    match trimmed.split_once('/') {
        Some((store, rest)) => (Some(store), Some(rest)),
        None => (Some(trimmed), None),
    }
}

/// Truncate at the first `#`, then strip one trailing `/`.
fn normalize_key(key: &str) -> String {
    let key = key.split_once('#').map_or(key, |(head, _)| head);
    key.strip_suffix('/').unwrap_or(key).to_owned()
}

/// Strip one trailing `/` from a store id.
fn normalize_store_id(store: &str) -> String {
    store.strip_suffix('/').unwrap_or(store).to_owned()
}

/// Query flags count as set unless empty, `false`, or `0`.
fn is_truthy(value: &str) -> bool {
    !matches!(value, "" | "false" | "0")
}

/// Decode a percent-encoded URI component.
fn decode_uri_component(s: &str) -> String {
    percent_decode_str(s).decode_utf8_lossy().into_owned()
}

/// Parse a query string into key-value pairs.
fn parse_query_params(query: &str) -> Vec<(String, String)> {
    query
        .split('&')
        .filter(|s| !s.is_empty())
        .map(|pair| match pair.split_once('=') {
            Some((k, v)) => (decode_uri_component(k), decode_uri_component(v)),
            None => (decode_uri_component(pair), String::new()),
        })
        .collect()
}

/// Get the value of a query parameter by name.
fn query_value<'a>(params: &'a [(String, String)], key: &str) -> Option<&'a str> {
    params
        .iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.as_str())
}

/// Path of a store root: `/{storeId}`.
#[must_use]
pub fn store_root_path(store_id: &StoreId) -> String {
    format!("/{}", utf8_percent_encode(store_id.as_str(), LOCATION_ESCAPE))
}

/// Canonical redirect target for a request that arrived via a referring
/// page outside the store.
///
/// Returns `None` when there is no referrer or it already names the store.
/// Otherwise the target is the referrer with `/{storeId}` and, when
/// present, `/{key}` appended.
#[must_use]
pub fn referrer_redirect(
    referrer: Option<&str>,
    store_id: &StoreId,
    key: Option<&str>,
) -> Option<String> {
    let referrer = referrer.filter(|r| !r.is_empty())?;
    if referrer.contains(store_id.as_str()) {
        return None;
    }
    let mut target = format!(
        "{}/{}",
        referrer.trim_end_matches('/'),
        utf8_percent_encode(store_id.as_str(), LOCATION_ESCAPE)
    );
    if let Some(key) = key {
        target.push('/');
        target.extend(utf8_percent_encode(key, LOCATION_ESCAPE));
    }
    Some(target)
}
