//! Resolution and assembly engine for the DataLayer Web2 gateway.
//!
//! This crate holds everything between an incoming key lookup and the
//! decision about how to serve the resulting bytes. It knows nothing about
//! HTTP framing; the `web2-gateway-http` crate turns its results into
//! responses, and `web2-gateway-rpc` supplies the remote store.
//!
//! # Architecture
//!
//! ```text
//! ResourceResolver
//!   -> DataLayerStore (fetch value / list keys)
//!   -> CompositeManifest detection
//!     -> MultipartResolver (ordered concurrent part fetch, hex concat)
//!       -> CompositeCache (sorted-parts key, in-flight guard)
//!   -> classify (extension table, JSON, data-URL image, opaque)
//! ```

pub mod cache;
pub mod classify;
pub mod config;
pub mod error;
pub mod hex;
pub mod manifest;
pub mod mime;
pub mod multipart;
pub mod resolver;
pub mod site;
pub mod store;
pub mod wallet;

pub use cache::{AssembledResource, CompositeCache};
pub use classify::{Classification, classify};
pub use config::GatewayConfig;
pub use error::{GatewayError, GatewayResult};
pub use manifest::CompositeManifest;
pub use multipart::MultipartResolver;
pub use resolver::{ResolvedResource, ResourceResolver, StoreRoot};
pub use store::{DataLayerStore, StoreId, StoreLookup};
pub use wallet::DepositAddressSource;
