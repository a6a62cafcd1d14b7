//! Panic recovery.

use std::any::Any;

use axum::{
    body::Body,
    http::{header, HeaderValue, Response, StatusCode},
    response::IntoResponse,
};
use tower_http::catch_panic::CatchPanicLayer;

use crate::observability::metrics;
use crate::security::headers::security_headers;

/// Turn a caught panic into an opaque 500 that closes the connection.
///
/// This runs outside the security header layer, so it sets them itself.
pub fn handle_panic(payload: Box<dyn Any + Send + 'static>) -> Response<Body> {
    let detail = if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else if let Some(s) = payload.downcast_ref::<&str>() {
        s
    } else {
        "unknown panic payload"
    };

    tracing::error!(panic = %detail, "Handler panicked");
    metrics::record_panic();

    let mut response = (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response();
    response
        .headers_mut()
        .insert(header::CONNECTION, HeaderValue::from_static("close"));
    for (name, value) in security_headers() {
        response.headers_mut().insert(name, value);
    }
    response
}

/// Outermost layer: catches panics from everything it wraps.
pub fn recover_panic() -> CatchPanicLayer<fn(Box<dyn Any + Send + 'static>) -> Response<Body>> {
    CatchPanicLayer::custom(handle_panic as fn(Box<dyn Any + Send + 'static>) -> Response<Body>)
}
