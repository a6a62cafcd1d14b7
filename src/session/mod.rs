//! Server-side sessions.
//!
//! # Data Flow
//! ```text
//! Cookie: session=<token>
//!     → layer.rs (load record from SessionStore, attach Session handle)
//!     → handlers read/write through the Session handle
//!     → layer.rs (commit: save / renew / destroy, emit Set-Cookie)
//! ```
//!
//! # Design Decisions
//! - The handle is request-local; only the store is shared between requests
//! - Nothing is written back unless the handle was modified
//! - Renewing keeps the data but moves it to a fresh token

pub mod layer;
pub mod store;

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use axum::{
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use rand::RngCore;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;

pub use layer::{load_session, SessionManager, SESSION_COOKIE_NAME};
pub use store::{MemoryStore, Record, SessionStore, StoreError};

/// Generate an opaque 256-bit token, base64url encoded.
pub fn generate_token() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

#[derive(Debug, Default)]
struct State {
    token: Option<String>,
    data: HashMap<String, Value>,
    modified: bool,
    stale_token: Option<String>,
    destroyed: bool,
}

/// What the session layer must persist once the handler has run.
#[derive(Debug, PartialEq)]
pub(crate) enum Commit {
    Unchanged,
    Save {
        token: String,
        stale_token: Option<String>,
        record: Record,
    },
    Destroy {
        token: Option<String>,
    },
}

/// Request-local handle to the caller's session.
#[derive(Clone, Debug, Default)]
pub struct Session {
    state: Arc<Mutex<State>>,
}

impl Session {
    pub(crate) fn new(token: Option<String>, record: Record) -> Self {
        Self {
            state: Arc::new(Mutex::new(State {
                token,
                data: record.data,
                ..Default::default()
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Current token, `None` for a session not yet stored.
    pub fn token(&self) -> Option<String> {
        self.lock().token.clone()
    }

    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let state = self.lock();
        let value = state.data.get(key)?.clone();
        serde_json::from_value(value).ok()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.lock().data.contains_key(key)
    }

    pub fn insert<T: Serialize>(&self, key: &str, value: T) -> Result<(), StoreError> {
        let value = serde_json::to_value(value)?;
        let mut state = self.lock();
        state.data.insert(key.to_string(), value);
        state.modified = true;
        Ok(())
    }

    pub fn remove(&self, key: &str) -> Option<Value> {
        let mut state = self.lock();
        let removed = state.data.remove(key);
        if removed.is_some() {
            state.modified = true;
        }
        removed
    }

    /// Read and delete a value in one step (flash messages).
    pub fn pop<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let value = self.remove(key)?;
        serde_json::from_value(value).ok()
    }

    /// Move the session data to a new token. Used whenever the privilege level changes.
    pub fn renew(&self) {
        let mut state = self.lock();
        if let Some(old) = state.token.take() {
            state.stale_token.get_or_insert(old);
        }
        state.modified = true;
    }

    /// Discard all data and the token.
    pub fn destroy(&self) {
        let mut state = self.lock();
        state.data.clear();
        state.destroyed = true;
    }

    pub(crate) fn commit(&self) -> Commit {
        let mut state = self.lock();
        if state.destroyed {
            let token = state.token.take().or_else(|| state.stale_token.take());
            return Commit::Destroy { token };
        }
        if !state.modified {
            return Commit::Unchanged;
        }

        let token = state.token.get_or_insert_with(generate_token).clone();
        state.modified = false;
        Commit::Save {
            token,
            stale_token: state.stale_token.take(),
            record: Record {
                data: state.data.clone(),
            },
        }
    }
}

impl<S: Send + Sync> FromRequestParts<S> for Session {
    type Rejection = (StatusCode, &'static str);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts.extensions.get::<Session>().cloned().ok_or_else(|| {
            tracing::error!("Session extractor used on a route without the session layer");
            (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error")
        })
    }
}
