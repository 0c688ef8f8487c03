//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (main.rs):
//!     Load config → Validate → Build HeaderSet → Bind listener → Serve
//!
//! Shutdown (signals.rs):
//!     SIGTERM/SIGINT → Shutdown::trigger → Stop accepting → Drain → Exit
//! ```

pub mod signals;

pub use signals::{wait_for_signal, Shutdown};
