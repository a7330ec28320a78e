//! Permissive cross-origin headers for browser clients.
//!
//! Preflight requests (`OPTIONS` with `Access-Control-Request-Method`) are
//! answered by the layer itself with 200 and never reach a handler.

use axum::http::{HeaderName, Method, header};
use tower_http::cors::{Any, CorsLayer};

/// Methods announced to browsers
pub const ALLOWED_METHODS: [Method; 6] = [
    Method::GET,
    Method::POST,
    Method::PUT,
    Method::DELETE,
    Method::OPTIONS,
    Method::HEAD,
];

/// Request headers a client may send
pub const ALLOWED_HEADERS: [HeaderName; 4] = [
    header::ORIGIN,
    header::CONTENT_TYPE,
    header::ACCEPT,
    header::AUTHORIZATION,
];

/// Response headers readable from scripts
pub const EXPOSED_HEADERS: [HeaderName; 2] = [header::LINK, header::LOCATION];

#[must_use]
pub fn layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(ALLOWED_METHODS)
        .allow_headers(ALLOWED_HEADERS)
        .expose_headers(EXPOSED_HEADERS)
}
