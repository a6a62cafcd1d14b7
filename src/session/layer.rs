//! Session load-and-save middleware.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    extract::State,
    http::{header, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};
use chrono::Utc;

use crate::config::SessionConfig;
use crate::http::cookies::{self, SetCookie};
use crate::http::response::AppError;
use crate::session::{Commit, Record, Session, SessionStore, StoreError};

/// Default name of the session cookie.
pub const SESSION_COOKIE_NAME: &str = "session";

/// Shared session backend plus cookie settings.
#[derive(Clone)]
pub struct SessionManager {
    store: Arc<dyn SessionStore>,
    config: SessionConfig,
}

impl SessionManager {
    pub fn new(store: Arc<dyn SessionStore>, config: SessionConfig) -> Self {
        Self { store, config }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    fn lifetime(&self) -> Duration {
        Duration::from_secs(self.config.lifetime_secs)
    }

    /// Find the session named by the request cookie, or start an empty one.
    async fn load(&self, token: Option<&str>) -> Result<Session, StoreError> {
        let Some(token) = token else {
            return Ok(Session::default());
        };

        match self.store.load(token).await? {
            Some(record) => Ok(Session::new(Some(token.to_string()), record)),
            None => Ok(Session::new(None, Record::default())),
        }
    }

    /// Persist the handle's changes and emit the matching cookie.
    async fn commit(&self, session: &Session, response: &mut Response) -> Result<(), StoreError> {
        match session.commit() {
            Commit::Unchanged => {}
            Commit::Save {
                token,
                stale_token,
                record,
            } => {
                if let Some(stale) = stale_token {
                    self.store.delete(&stale).await?;
                }
                let lifetime = self.lifetime();
                let expiry = Utc::now()
                    + chrono::Duration::from_std(lifetime)
                        .map_err(|e| StoreError::Backend(format!("invalid session lifetime: {e}")))?;
                self.store.save(&token, &record, expiry).await?;

                SetCookie::new(&self.config.cookie_name, &token)
                    .secure(self.config.cookie_secure)
                    .same_site(self.config.cookie_same_site)
                    .max_age(lifetime)
                    .append_to(response.headers_mut());
            }
            Commit::Destroy { token } => {
                if let Some(token) = token {
                    self.store.delete(&token).await?;
                }
                SetCookie::expired(&self.config.cookie_name)
                    .secure(self.config.cookie_secure)
                    .same_site(self.config.cookie_same_site)
                    .append_to(response.headers_mut());
            }
        }
        Ok(())
    }
}

/// Load the caller's session before the inner chain runs and save it afterwards.
pub async fn load_session(State(manager): State<SessionManager>, mut request: Request<Body>, next: Next) -> Response {
    let token = cookies::read(request.headers(), &manager.config.cookie_name).map(str::to_owned);

    let session = match manager.load(token.as_deref()).await {
        Ok(session) => session,
        Err(e) => return AppError::from(e).into_response(),
    };
    request.extensions_mut().insert(session.clone());

    let mut response = next.run(request).await;

    if let Err(e) = manager.commit(&session, &mut response).await {
        return AppError::from(e).into_response();
    }

    response
        .headers_mut()
        .append(header::VARY, header::HeaderValue::from_static("Cookie"));
    response
}
