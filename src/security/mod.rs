//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Every response:
//!     → headers.rs (CSP, Referrer-Policy, nosniff, frame denial)
//!
//! Dynamic pages:
//!     → csrf.rs (issue token cookie, verify unsafe methods)
//!     → Pass to authentication
//! ```
//!
//! # Design Decisions
//! - Fail closed: a missing or mismatched token is a rejection, never a warning
//! - No trust in client input

pub mod csrf;
pub mod headers;

pub use csrf::{csrf_guard, CsrfGuard, CsrfToken};
pub use headers::secure_headers;
