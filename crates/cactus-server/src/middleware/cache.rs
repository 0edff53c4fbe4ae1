//! Cache-disabling headers.
//!
//! Edits must show up on the next request, so browsers are told never to
//! reuse a stored response.

use axum::http::HeaderValue;
use axum::http::header;
use tower_http::set_header::SetResponseHeaderLayer;

/// Cache-Control header value.
const NO_CACHE: &str = "no-cache, no-store, must-revalidate";

/// Create layer that adds Cache-Control header.
pub(crate) fn no_cache_layer() -> SetResponseHeaderLayer<HeaderValue> {
    SetResponseHeaderLayer::overriding(header::CACHE_CONTROL, HeaderValue::from_static(NO_CACHE))
}

/// Create layer that adds Expires header for HTTP/1.0 caches.
pub(crate) fn expires_layer() -> SetResponseHeaderLayer<HeaderValue> {
    SetResponseHeaderLayer::overriding(header::EXPIRES, HeaderValue::from_static("0"))
}

