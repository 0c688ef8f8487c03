//! HTTP host for the header injection middleware.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, layer order)
//!     → HeaderInjectionLayer (wraps everything below)
//!     → preflight.rs (OPTIONS short-circuit)
//!     → handlers.rs / static files / 404 fallback
//!     → Send to client
//! ```

pub mod handlers;
pub mod preflight;
pub mod server;

pub use server::HttpServer;
