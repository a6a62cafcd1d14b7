//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! SIGTERM/SIGINT → wait_for_signal() → Shutdown::trigger()
//!     → HTTP server stops accepting → in-flight requests drain → exit
//! ```
//!
//! # Design Decisions
//! - One broadcast channel fans the signal out to every long-running task
//! - Shutdown has a deadline: the process exits even if draining stalls

pub mod shutdown;

pub use shutdown::{wait_for_signal, Shutdown};
