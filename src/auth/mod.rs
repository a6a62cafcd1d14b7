//! Caller identity.
//!
//! # Data Flow
//! ```text
//! Session (authenticatedUserID)
//!     → middleware.rs::authenticate (re-validate against UserStore)
//!     → AuthContext in request extensions
//!     → middleware.rs::require_authentication (protected routes only)
//!     → handlers (AuthContext extractor / is_authenticated)
//! ```
//!
//! # Design Decisions
//! - Fail closed: a user-store error aborts the request instead of downgrading it
//! - A session naming a deleted user is silently treated as anonymous
//! - The context is keyed by its type, so no other component can collide with it

pub mod middleware;

use std::convert::Infallible;

use axum::{
    body::Body,
    extract::FromRequestParts,
    http::{request::Parts, Request},
};

use crate::models::UserId;

pub use middleware::{authenticate, require_authentication, LOGIN_PATH};

/// Session key holding the logged-in user's ID.
pub const AUTHENTICATED_USER_ID: &str = "authenticatedUserID";

/// Identity resolved for the current request.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum AuthContext {
    #[default]
    Anonymous,
    Authenticated(UserId),
}

impl AuthContext {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, AuthContext::Authenticated(_))
    }

    pub fn user_id(&self) -> Option<UserId> {
        match self {
            AuthContext::Authenticated(id) => Some(*id),
            AuthContext::Anonymous => None,
        }
    }
}

/// Whether the authenticate middleware resolved a live user for this request.
pub fn is_authenticated(request: &Request<Body>) -> bool {
    request
        .extensions()
        .get::<AuthContext>()
        .is_some_and(AuthContext::is_authenticated)
}

impl<S: Send + Sync> FromRequestParts<S> for AuthContext {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts.extensions.get::<AuthContext>().copied().unwrap_or_default())
    }
}
