//! Identity resolution and the protected-route gate.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderValue, Request},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};

use crate::auth::{is_authenticated, AuthContext, AUTHENTICATED_USER_ID};
use crate::http::response::AppError;
use crate::models::UserStore;
use crate::session::Session;

/// Where anonymous callers of protected routes are sent.
pub const LOGIN_PATH: &str = "/user/login";

/// Resolve the caller's identity from the session and attach an [`AuthContext`].
pub async fn authenticate(State(users): State<Arc<dyn UserStore>>, mut request: Request<Body>, next: Next) -> Response {
    let Some(session) = request.extensions().get::<Session>().cloned() else {
        return AppError::Dependency("authenticate ran without a loaded session".into()).into_response();
    };

    let id = session.get::<i64>(AUTHENTICATED_USER_ID).unwrap_or_default();
    if id == 0 {
        request.extensions_mut().insert(AuthContext::Anonymous);
        return next.run(request).await;
    }

    let context = match users.exists(id).await {
        Ok(true) => AuthContext::Authenticated(id),
        Ok(false) => {
            tracing::debug!(user_id = id, "Session references a missing user");
            AuthContext::Anonymous
        }
        Err(e) => return AppError::from(e).into_response(),
    };

    request.extensions_mut().insert(context);
    next.run(request).await
}

/// Redirect anonymous callers to the login page; mark authenticated responses uncacheable.
pub async fn require_authentication(request: Request<Body>, next: Next) -> Response {
    if !is_authenticated(&request) {
        return Redirect::to(LOGIN_PATH).into_response();
    }

    let mut response = next.run(request).await;
    response
        .headers_mut()
        .append(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
    response
}
