//! Double-submit-cookie CSRF protection.
//!
//! # Responsibilities
//! - Bind a random base token to the client through an HTTP-only cookie
//! - Expose a masked copy of the token to the rendering path
//! - Reject unsafe requests whose submitted token does not match the cookie
//!
//! # Design Decisions
//! - Masking with a fresh one-time pad per render keeps the page body from
//!   revealing the token to compression side channels
//! - Missing, malformed and wrong tokens share one code path and one response

use axum::{
    body::Body,
    extract::State,
    http::{header, Method, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use rand::RngCore;
use std::time::Duration;

use crate::config::CsrfConfig;
use crate::http::cookies::{self, SetCookie};
use crate::http::response::AppError;
use crate::observability::metrics;

pub const TOKEN_LEN: usize = 32;

pub const CSRF_COOKIE_NAME: &str = "csrf_token";
pub const CSRF_FORM_FIELD: &str = "csrf_token";
pub const CSRF_HEADER_NAME: &str = "x-csrf-token";

/// The per-client anti-forgery token for the current request.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct CsrfToken([u8; TOKEN_LEN]);

impl std::fmt::Debug for CsrfToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("CsrfToken(..)")
    }
}

impl CsrfToken {
    pub fn generate() -> Self {
        let mut bytes = [0u8; TOKEN_LEN];
        rand::thread_rng().fill_bytes(&mut bytes);
        Self(bytes)
    }

    /// Decode the cookie form of a token.
    fn from_cookie(value: &str) -> Option<Self> {
        let bytes = URL_SAFE_NO_PAD.decode(value).ok()?;
        Some(Self(bytes.try_into().ok()?))
    }

    fn to_cookie(self) -> String {
        URL_SAFE_NO_PAD.encode(self.0)
    }

    /// A masked copy for embedding in a page: `pad || pad ^ token`.
    pub fn masked(&self) -> String {
        let mut out = [0u8; TOKEN_LEN * 2];
        let (pad, masked) = out.split_at_mut(TOKEN_LEN);
        rand::thread_rng().fill_bytes(pad);
        for i in 0..TOKEN_LEN {
            masked[i] = pad[i] ^ self.0[i];
        }
        URL_SAFE_NO_PAD.encode(out)
    }

    /// Recover the base token from a masked or plain submitted value.
    fn unmask(submitted: &str) -> Option<[u8; TOKEN_LEN]> {
        let bytes = URL_SAFE_NO_PAD.decode(submitted.trim()).ok()?;
        match bytes.len() {
            TOKEN_LEN => bytes.try_into().ok(),
            len if len == TOKEN_LEN * 2 => {
                let (pad, masked) = bytes.split_at(TOKEN_LEN);
                let mut token = [0u8; TOKEN_LEN];
                for i in 0..TOKEN_LEN {
                    token[i] = pad[i] ^ masked[i];
                }
                Some(token)
            }
            _ => None,
        }
    }

    /// Check a submitted value against this token.
    pub fn verify(&self, submitted: Option<&str>) -> bool {
        let (present, candidate) = match submitted.and_then(Self::unmask) {
            Some(token) => (true, token),
            None => (false, [0u8; TOKEN_LEN]),
        };
        constant_time_eq(&self.0, &candidate) & present
    }
}

/// Constant-time byte comparison to prevent timing attacks.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        result |= x ^ y;
    }
    result == 0
}

fn is_safe(method: &Method) -> bool {
    matches!(*method, Method::GET | Method::HEAD | Method::OPTIONS | Method::TRACE)
}

fn is_form(request: &Request<Body>) -> bool {
    request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("application/x-www-form-urlencoded"))
}

/// Settings for the CSRF middleware.
#[derive(Clone, Debug)]
pub struct CsrfGuard {
    config: CsrfConfig,
    body_limit: usize,
}

impl CsrfGuard {
    pub fn new(config: CsrfConfig, body_limit: usize) -> Self {
        Self { config, body_limit }
    }

    /// The token cookie. Never sent over plain HTTP.
    fn cookie<'a>(&'a self, value: &'a str) -> SetCookie<'a> {
        SetCookie::new(&self.config.cookie_name, value)
            .secure(true)
            .max_age(Duration::from_secs(self.config.max_age_secs))
    }

    /// Pull the submitted token out of the header or the urlencoded body.
    ///
    /// The body is buffered and handed back so the handler can still read it.
    async fn submitted_token(&self, request: Request<Body>) -> Result<(Option<String>, Request<Body>), AppError> {
        let from_header = request
            .headers()
            .get(self.config.header_name.as_str())
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned);
        if from_header.is_some() {
            return Ok((from_header, request));
        }

        if !is_form(&request) {
            return Ok((None, request));
        }

        let (parts, body) = request.into_parts();
        let bytes = axum::body::to_bytes(body, self.body_limit)
            .await
            .map_err(|_| AppError::ClientInput)?;

        let token = serde_urlencoded::from_bytes::<Vec<(String, String)>>(&bytes)
            .ok()
            .and_then(|fields| {
                fields
                    .into_iter()
                    .find(|(name, _)| *name == self.config.form_field)
                    .map(|(_, value)| value)
            });

        Ok((token, Request::from_parts(parts, Body::from(bytes))))
    }
}

/// Issue the client's CSRF token and verify it on unsafe requests.
pub async fn csrf_guard(State(guard): State<CsrfGuard>, mut request: Request<Body>, next: Next) -> Response {
    let existing = cookies::read(request.headers(), &guard.config.cookie_name).and_then(CsrfToken::from_cookie);
    let issued = existing.is_none();
    let token = existing.unwrap_or_else(CsrfToken::generate);
    let cookie_value = token.to_cookie();

    request.extensions_mut().insert(token);

    let mut response = if is_safe(request.method()) {
        next.run(request).await
    } else {
        match guard.submitted_token(request).await {
            Ok((submitted, request)) => {
                if token.verify(submitted.as_deref()) {
                    next.run(request).await
                } else {
                    tracing::warn!("CSRF token rejected");
                    metrics::record_csrf_rejection();
                    (StatusCode::FORBIDDEN, "Forbidden").into_response()
                }
            }
            Err(e) => e.into_response(),
        }
    };

    if issued {
        guard.cookie(&cookie_value).append_to(response.headers_mut());
    }
    response
}
