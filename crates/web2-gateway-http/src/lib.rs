//! HTTP layer for the DataLayer Web2 gateway.
//!
//! - **Routing** ([`router`]): maps paths onto gateway routes, normalizes
//!   keys, and computes referrer-based canonical redirects.
//! - **Dispatch** ([`dispatch`]): frames a classified value as a response.
//! - **Responses** ([`response`]): fixed documents, redirects, JSON errors.
//! - **Service** ([`service`]): the hyper `Service` tying it together.
//! - **Body** ([`body`]): the buffered/empty response body type.
//!
//! # Architecture
//!
//! ```text
//! HTTP Request
//!   -> GatewayHttpService (hyper Service)
//!     -> CORS preflight / method filter
//!     -> GatewayRouter (welcome, .well-known, health, store root, key)
//!     -> referrer canonicalization (301)
//!     -> ResourceResolver (web2-gateway-core)
//!     -> classification_response, or 301 to the store root on a miss
//!     -> common response headers (x-request-id, Server, CORS)
//!   <- HTTP Response
//! ```

pub mod body;
pub mod dispatch;
pub mod response;
pub mod router;
pub mod service;

pub use body::GatewayResponseBody;
pub use dispatch::classification_response;
pub use router::{GatewayRoute, GatewayRouter};
pub use service::{GatewayHttpConfig, GatewayHttpService};
