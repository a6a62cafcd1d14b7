//! Cross-cutting interceptors shared by every route.

pub mod access_log;
pub mod recover;

pub use access_log::log_request;
pub use recover::{handle_panic, recover_panic};
