//! Persistence collaborators.
//!
//! # Data Flow
//! ```text
//! handlers.rs
//!     → SnippetStore (latest / get / insert)
//!     → UserStore (exists / insert / authenticate)
//!     → ModelError (translated into AppError at the handler boundary)
//! ```
//!
//! # Design Decisions
//! - Stores are traits so the pipeline never depends on a concrete backend
//! - In-memory implementations back the binary and the tests

pub mod snippets;
pub mod users;

use thiserror::Error;

pub use snippets::{MemorySnippetStore, Snippet, SnippetStore};
pub use users::{MemoryUserStore, User, UserId, UserStore};

/// Errors surfaced by the record and user stores.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("no matching record found")]
    NoRecord,

    #[error("duplicate email")]
    DuplicateEmail,

    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("store failure: {0}")]
    Backend(String),
}
