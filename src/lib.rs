//! Snippetbox library: a server-rendered snippet sharing service.

// Request pipeline
pub mod auth;
pub mod http;
pub mod security;
pub mod session;

// Domain
pub mod models;
pub mod validator;

// Cross-cutting concerns
pub mod config;
pub mod lifecycle;
pub mod observability;

pub use config::AppConfig;
pub use http::{build_router, AppState, HttpServer};
pub use lifecycle::Shutdown;
