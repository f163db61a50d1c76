//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Shutdown (shutdown.rs):
//!     SIGTERM/SIGINT → Shutdown::trigger → server stops accepting → drain → exit
//! ```

pub mod shutdown;

pub use shutdown::{wait_for_signal, Shutdown};
