//! The gateway HTTP service implementing hyper's `Service` trait.
//!
//! [`GatewayHttpService`] handles, in order:
//!
//! 1. CORS preflight requests (`OPTIONS`)
//! 2. Method filtering (read-only: `GET` and `HEAD`)
//! 3. Routing via [`GatewayRouter`]
//! 4. Referrer canonicalization for store requests
//! 5. Key or store-root resolution, with SPA fallback on key misses
//! 6. Common response headers (`x-request-id`, `Server`, CORS)

use std::convert::Infallible;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use http::StatusCode;
use http::header::{HeaderValue, REFERER};
use hyper::body::Incoming;
use hyper::service::Service;
use tracing::{debug, info, warn};
use uuid::Uuid;
use web2_gateway_core::{DepositAddressSource, ResourceResolver, StoreId, StoreRoot};

use crate::body::GatewayResponseBody;
use crate::dispatch::classification_response;
use crate::response::{
    STORE_UNAVAILABLE_MESSAGE, cors_preflight_response, health_response, html_response,
    json_error, json_response, method_not_allowed, redirect, welcome_response,
    well_known_response,
};
use crate::router::{GatewayRoute, GatewayRouter, referrer_redirect, store_root_path};

const SERVER_NAME: &str = "Web2Gateway";

/// Configuration for the gateway HTTP service.
#[derive(Debug, Clone)]
pub struct GatewayHttpConfig {
    /// Address reported as `donation_address` by `/.well-known`.
    pub donation_address: String,
}

impl Default for GatewayHttpConfig {
    fn default() -> Self {
        Self {
            donation_address: web2_gateway_core::config::DEFAULT_DONATION_ADDRESS.to_owned(),
        }
    }
}

/// The gateway HTTP service.
///
/// Cheap to clone; every clone shares the resolver, wallet and cache.
#[derive(Clone)]
pub struct GatewayHttpService {
    resolver: Arc<ResourceResolver>,
    wallet: Arc<dyn DepositAddressSource>,
    router: GatewayRouter,
    config: Arc<GatewayHttpConfig>,
}

impl std::fmt::Debug for GatewayHttpService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayHttpService")
            .field("resolver", &self.resolver)
            .field("router", &self.router)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl GatewayHttpService {
    /// Create a service over `resolver`, using `wallet` for `/.well-known`.
    #[must_use]
    pub fn new(
        resolver: Arc<ResourceResolver>,
        wallet: Arc<dyn DepositAddressSource>,
        config: GatewayHttpConfig,
    ) -> Self {
        Self {
            resolver,
            wallet,
            router: GatewayRouter::new(),
            config: Arc::new(config),
        }
    }

    /// Handle one request end to end, including common headers.
    ///
    /// Request bodies are never read.
    pub async fn handle<B>(&self, req: http::Request<B>) -> http::Response<GatewayResponseBody> {
        let request_id = Uuid::new_v4().to_string();
        let (parts, _) = req.into_parts();
        let req = http::Request::from_parts(parts, ());
        let response = self.process_request(&req, &request_id).await;
        add_common_headers(response, &request_id)
    }

    async fn process_request(
        &self,
        req: &http::Request<()>,
        request_id: &str,
    ) -> http::Response<GatewayResponseBody> {
        let method = req.method();
        let uri = req.uri();
        debug!(%method, %uri, request_id, "processing gateway request");

        if method == http::Method::OPTIONS {
            return cors_preflight_response();
        }
        if method != http::Method::GET && method != http::Method::HEAD {
            return method_not_allowed(method);
        }

        let route = self.router.resolve(req);

        if let Some(store_id) = route.store_id() {
            let referrer = req.headers().get(REFERER).and_then(|v| v.to_str().ok());
            if let Some(target) = referrer_redirect(referrer, store_id, route.key()) {
                info!(
                    %store_id,
                    referrer,
                    target = %target,
                    request_id,
                    "canonicalizing via referrer"
                );
                return redirect(&target);
            }
        }

        match route {
            GatewayRoute::Welcome => welcome_response(),
            GatewayRoute::Health => health_response(self.resolver.store().is_available().await),
            GatewayRoute::WellKnown => {
                let address = self.wallet.deposit_address().await;
                well_known_response(address.as_deref(), &self.config.donation_address)
            }
            GatewayRoute::StoreRoot {
                store_id,
                show_keys,
            } => self.store_root(&store_id, show_keys, request_id).await,
            GatewayRoute::Resource {
                store_id,
                key,
                root_hash,
            } => {
                self.resource(&store_id, &key, root_hash.as_deref(), request_id)
                    .await
            }
        }
    }

    async fn store_root(
        &self,
        store_id: &StoreId,
        show_keys: bool,
        request_id: &str,
    ) -> http::Response<GatewayResponseBody> {
        match self.resolver.resolve_store_root(store_id, show_keys).await {
            Ok(StoreRoot::Website(html)) => {
                debug!(%store_id, request_id, "serving store as website");
                html_response(html)
            }
            Ok(StoreRoot::Keys(keys)) => json_response(StatusCode::OK, &serde_json::json!(keys)),
            Err(e) => {
                warn!(%store_id, error = %e, request_id, "store root unavailable");
                json_error(StatusCode::INTERNAL_SERVER_ERROR, STORE_UNAVAILABLE_MESSAGE)
            }
        }
    }

    async fn resource(
        &self,
        store_id: &StoreId,
        key: &str,
        root_hash: Option<&str>,
        request_id: &str,
    ) -> http::Response<GatewayResponseBody> {
        match self.resolver.resolve_key(store_id, key, root_hash).await {
            Ok(resolved) => {
                debug!(
                    %store_id,
                    key,
                    composite = resolved.composite,
                    content_type = ?resolved.classification.content_type(),
                    request_id,
                    "resolved key"
                );
                classification_response(resolved.classification)
            }
            Err(e) => {
                let target = store_root_path(store_id);
                info!(
                    %store_id,
                    key,
                    error = %e,
                    target = %target,
                    request_id,
                    "falling back to store root"
                );
                redirect(&target)
            }
        }
    }
}

impl Service<http::Request<Incoming>> for GatewayHttpService {
    type Response = http::Response<GatewayResponseBody>;
    type Error = Infallible;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn call(&self, req: http::Request<Incoming>) -> Self::Future {
        let service = self.clone();
        Box::pin(async move { Ok(service.handle(req).await) })
    }
}

/// Add common response headers to every gateway response.
fn add_common_headers(
    mut response: http::Response<GatewayResponseBody>,
    request_id: &str,
) -> http::Response<GatewayResponseBody> {
    let headers = response.headers_mut();

    if let Ok(hv) = HeaderValue::from_str(request_id) {
        headers.insert("x-request-id", hv);
    }
    headers.insert("Server", HeaderValue::from_static(SERVER_NAME));
    headers.insert("Access-Control-Allow-Origin", HeaderValue::from_static("*"));
    headers.insert(
        "Access-Control-Expose-Headers",
        HeaderValue::from_static("x-request-id, Location"),
    );

    response
}
