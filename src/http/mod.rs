//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware chain)
//!     → middleware/ (panic recovery, access log)
//!     → request.rs (assign request ID)
//!     → [session → csrf → authenticate] for dynamic pages
//!     → handlers.rs (forms.rs validation, templates.rs rendering)
//!     → response.rs (map failures to status codes)
//!     → Send to client
//! ```

pub mod cookies;
pub mod forms;
pub mod handlers;
pub mod middleware;
pub mod request;
pub mod response;
pub mod server;
pub mod templates;

pub use request::{RequestIdExt, X_REQUEST_ID};
pub use response::AppError;
pub use server::{build_router, AppState, HttpServer};
