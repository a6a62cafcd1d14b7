//! Security response headers.
//!
//! # Responsibilities
//! - Set a fixed set of hardening headers on every response
//!
//! # Design Decisions
//! - Headers override anything set further in, so handlers cannot weaken them
//! - Applied outside the dynamic routes so error and ping responses carry them too

use axum::{
    http::{header, HeaderName, HeaderValue},
    Router,
};
use tower_http::set_header::SetResponseHeaderLayer;

pub const CONTENT_SECURITY_POLICY: &str =
    "default-src 'self'; style-src 'self' fonts.googleapis.com; font-src fonts.gstatic.com";
pub const REFERRER_POLICY: &str = "origin-when-cross-origin";

/// The headers set on every response, in the order they are applied.
pub fn security_headers() -> [(HeaderName, HeaderValue); 5] {
    [
        (
            header::CONTENT_SECURITY_POLICY,
            HeaderValue::from_static(CONTENT_SECURITY_POLICY),
        ),
        (header::REFERRER_POLICY, HeaderValue::from_static(REFERRER_POLICY)),
        (header::X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff")),
        (header::X_FRAME_OPTIONS, HeaderValue::from_static("deny")),
        (header::X_XSS_PROTECTION, HeaderValue::from_static("0")),
    ]
}

/// Wrap `router` so every response carries [`security_headers`].
pub fn secure_headers<S>(router: Router<S>) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    security_headers()
        .into_iter()
        .fold(router, |router, (name, value)| {
            router.layer(SetResponseHeaderLayer::overriding(name, value))
        })
}
