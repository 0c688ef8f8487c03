//! Cross-origin isolation and CORS response headers for a trusted front end.
//!
//! The core is [`security::HeaderInjectionMiddleware`]: it stamps a fixed
//! [`security::HeaderSet`] onto every response and delegates unchanged. The
//! rest of the crate hosts it in an Axum server with configuration, logging
//! and graceful shutdown.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod security;

pub use config::ServerConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use security::{HeaderInjectionLayer, HeaderInjectionMiddleware, HeaderSet};
