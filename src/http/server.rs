//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router with all handlers
//! - Wire up the middleware chain in its fixed order
//! - Bind server to listener
//! - Run background tasks (session cleanup)
//!
//! # Middleware order (outermost first)
//! ```text
//! panic recovery → request id → trace span → access log → security headers → timeout → body limit
//!     → [dynamic routes] session load → CSRF → authenticate
//!         → [protected routes] require authentication
//!             → handler
//! ```

use axum::{
    http::StatusCode,
    middleware,
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{limit::RequestBodyLimitLayer, timeout::TimeoutLayer, trace::TraceLayer};

use crate::auth::{authenticate, require_authentication};
use crate::config::AppConfig;
use crate::http::handlers;
use crate::http::middleware::{log_request, recover_panic};
use crate::http::request::with_request_id;
use crate::http::templates;
use crate::models::{MemorySnippetStore, MemoryUserStore, SnippetStore, UserStore};
use crate::security::csrf::{csrf_guard, CsrfGuard};
use crate::security::headers::secure_headers;
use crate::session::{load_session, MemoryStore, SessionManager, SessionStore};

/// Application state injected into handlers and middleware.
#[derive(Clone)]
pub struct AppState {
    pub snippets: Arc<dyn SnippetStore>,
    pub users: Arc<dyn UserStore>,
    pub sessions: SessionManager,
    pub csrf: CsrfGuard,
    pub templates: Arc<minijinja::Environment<'static>>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    /// Assemble state from the external collaborators.
    pub fn new(
        config: AppConfig,
        snippets: Arc<dyn SnippetStore>,
        users: Arc<dyn UserStore>,
        session_store: Arc<dyn SessionStore>,
    ) -> Result<Self, minijinja::Error> {
        Ok(Self {
            snippets,
            users,
            sessions: SessionManager::new(session_store, config.session.clone()),
            csrf: CsrfGuard::new(config.csrf.clone(), config.security.max_body_size),
            templates: Arc::new(templates::environment()?),
            config: Arc::new(config),
        })
    }
}

/// Build the router with the full middleware chain.
pub fn build_router(state: AppState) -> Router {
    let protected = Router::new()
        .route(
            "/snippet/create",
            get(handlers::snippet_create).post(handlers::snippet_create_post),
        )
        .route("/user/logout", post(handlers::user_logout_post))
        .route_layer(middleware::from_fn(require_authentication));

    let dynamic = Router::new()
        .route("/", get(handlers::home))
        .route("/snippet/view/{id}", get(handlers::snippet_view))
        .route("/user/signup", get(handlers::user_signup).post(handlers::user_signup_post))
        .route("/user/login", get(handlers::user_login).post(handlers::user_login_post))
        .merge(protected)
        .layer(middleware::from_fn_with_state(state.users.clone(), authenticate))
        .layer(middleware::from_fn_with_state(state.csrf.clone(), csrf_guard))
        .layer(middleware::from_fn_with_state(state.sessions.clone(), load_session));

    let router = Router::new()
        .route("/ping", get(handlers::ping))
        .merge(dynamic)
        .layer(RequestBodyLimitLayer::new(state.config.security.max_body_size))
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(state.config.timeouts.request_secs),
        ));

    let router = secure_headers(router)
        .layer(middleware::from_fn(log_request))
        .layer(TraceLayer::new_for_http());

    with_request_id(router).layer(recover_panic()).with_state(state)
}

/// HTTP server for the snippet service.
pub struct HttpServer {
    router: Router,
    config: AppConfig,
    session_store: MemoryStore,
}

impl HttpServer {
    /// Create a server backed by in-memory stores.
    pub fn new(config: AppConfig) -> Result<Self, minijinja::Error> {
        let session_store = MemoryStore::new();
        let state = AppState::new(
            config.clone(),
            Arc::new(MemorySnippetStore::new()),
            Arc::new(MemoryUserStore::new()),
            Arc::new(session_store.clone()),
        )?;

        Ok(Self {
            router: build_router(state),
            config,
            session_store,
        })
    }

    /// Run the server until `shutdown` fires, then drain in-flight requests.
    pub async fn run(self, listener: TcpListener, mut shutdown: broadcast::Receiver<()>) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            "HTTP server starting"
        );

        let cleanup = self
            .session_store
            .spawn_cleanup(Duration::from_secs(self.config.session.cleanup_interval_secs));

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();

        let result = axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("HTTP server draining connections");
            })
            .await;

        cleanup.abort();
        tracing::info!("HTTP server stopped");
        result
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }
}
